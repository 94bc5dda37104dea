// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Policy Value Objects
//!
//! A security policy is an allow-list: traffic that no inbound rule matches is
//! denied. Rules name their source either as any IPv4 address or as the set of
//! resources carrying another policy.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{TopologyError, TopologyResult};

/// Transport protocol of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    /// Every protocol, used for unrestricted egress
    All,
}

impl Protocol {
    /// Protocol as spelled in provider templates
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::All => "-1",
        }
    }
}

/// Protocol plus inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PortFields")]
pub struct Port {
    protocol: Protocol,
    from: u16,
    to: u16,
}

/// Unchecked wire form of [`Port`]
#[derive(Deserialize)]
struct PortFields {
    protocol: Protocol,
    from: u16,
    to: u16,
}

impl TryFrom<PortFields> for Port {
    type Error = TopologyError;

    fn try_from(fields: PortFields) -> Result<Self, Self::Error> {
        match fields.protocol {
            Protocol::All if fields.from == 0 && fields.to == u16::MAX => Ok(Self::all_traffic()),
            Protocol::All => Err(TopologyError::InvalidPort {
                from: fields.from,
                to: fields.to,
            }),
            protocol => Self::range(protocol, fields.from, fields.to),
        }
    }
}

impl Port {
    /// Single TCP port
    pub fn tcp(port: u16) -> TopologyResult<Self> {
        Self::range(Protocol::Tcp, port, port)
    }

    /// Inclusive range
    ///
    /// # Invariants
    /// - Port 0 is not addressable
    /// - `from <= to`
    pub fn range(protocol: Protocol, from: u16, to: u16) -> TopologyResult<Self> {
        if protocol == Protocol::All || from == 0 || from > to {
            return Err(TopologyError::InvalidPort { from, to });
        }
        Ok(Self { protocol, from, to })
    }

    /// Every protocol and port
    pub fn all_traffic() -> Self {
        Self {
            protocol: Protocol::All,
            from: 0,
            to: u16::MAX,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn from_port(&self) -> u16 {
        self.from
    }

    pub fn to_port(&self) -> u16 {
        self.to
    }

    pub fn is_all_traffic(&self) -> bool {
        self.protocol == Protocol::All
    }

    pub fn contains(&self, port: u16) -> bool {
        self.is_all_traffic() || (self.from..=self.to).contains(&port)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            Protocol::All => write!(f, "all traffic"),
            _ if self.from == self.to => write!(f, "{} {}", self.protocol.as_str(), self.from),
            _ => write!(f, "{} {}-{}", self.protocol.as_str(), self.from, self.to),
        }
    }
}

/// Source of inbound traffic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "policy")]
pub enum Peer {
    /// `0.0.0.0/0`
    AnyIpv4,
    /// Resources carrying the named policy
    Policy(String),
}

impl Peer {
    pub fn any_ipv4() -> Self {
        Self::AnyIpv4
    }

    pub fn policy(name: impl Into<String>) -> Self {
        Self::Policy(name.into())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::AnyIpv4)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyIpv4 => write!(f, "0.0.0.0/0"),
            Self::Policy(name) => write!(f, "policy:{}", name),
        }
    }
}

/// One allow-list entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngressRule {
    pub peer: Peer,
    pub port: Port,
    pub description: String,
}

impl IngressRule {
    pub fn new(peer: Peer, port: Port, description: impl Into<String>) -> Self {
        Self {
            peer,
            port,
            description: description.into(),
        }
    }

    /// Whether this rule lets `peer` reach `port` over TCP
    pub fn allows_tcp(&self, peer: &Peer, port: u16) -> bool {
        let protocol_ok = matches!(self.port.protocol(), Protocol::Tcp | Protocol::All);
        let peer_ok = self.peer.is_any() || &self.peer == peer;
        protocol_ok && peer_ok && self.port.contains(port)
    }
}

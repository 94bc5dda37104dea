// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::errors::{TopologyError, TopologyResult};

/// IPv4 block in CIDR notation
///
/// Invariants:
/// - Valid IPv4 address
/// - Prefix length 0-32
/// - No host bits set below the prefix
///
/// # Examples
///
/// ```rust
/// use cloud_topology::domain::Ipv4Cidr;
///
/// let cidr = Ipv4Cidr::new("10.0.0.0/16").unwrap();
/// assert_eq!(cidr.prefix_len(), 16);
/// assert_eq!(cidr.num_addresses(), 65_536);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// `10.0.0.0/16`
    pub const DEFAULT_NETWORK: Self = Self {
        address: Ipv4Addr::new(10, 0, 0, 0),
        prefix_len: 16,
    };

    /// Parse a block such as `10.0.0.0/16`
    pub fn new(cidr: impl AsRef<str>) -> TopologyResult<Self> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| TopologyError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| TopologyError::InvalidCidr(cidr.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| TopologyError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_len)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_len: u8) -> TopologyResult<Self> {
        if prefix_len > 32 {
            return Err(TopologyError::InvalidPrefixLength(prefix_len));
        }

        // Invariant: the address is the first address of its block
        let host_mask = u32::MAX.checked_shr(u32::from(prefix_len)).unwrap_or(0);
        if u32::from(address) & host_mask != 0 {
            return Err(TopologyError::InvalidCidr(format!(
                "{}/{} has host bits set",
                address, prefix_len
            )));
        }

        Ok(Self {
            address,
            prefix_len,
        })
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses covered by the block
    pub fn num_addresses(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = TopologyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.to_string()
    }
}

/// Subnet prefix length
///
/// Invariants:
/// - Between /16 and /28, the range the provider accepts for VPC subnets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SubnetMask(u8);

impl SubnetMask {
    /// Widest subnet the provider allows
    pub const MIN: u8 = 16;

    /// Narrowest subnet the provider allows
    pub const MAX: u8 = 28;

    /// `/24`
    pub const DEFAULT: Self = Self(24);

    pub fn new(prefix_len: u8) -> TopologyResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&prefix_len) {
            return Err(TopologyError::InvalidSubnetMask(prefix_len));
        }
        Ok(Self(prefix_len))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Host bits below the mask, the `cidrBits` argument of `Fn::Cidr`
    pub fn host_bits(&self) -> u8 {
        32 - self.0
    }

    /// Number of addresses in one subnet of this size
    pub fn block_size(&self) -> u64 {
        1u64 << self.host_bits()
    }
}

impl fmt::Display for SubnetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl TryFrom<u8> for SubnetMask {
    type Error = TopologyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubnetMask> for u8 {
    fn from(value: SubnetMask) -> Self {
        value.0
    }
}

/// Number of availability zones a network spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct AzCount(usize);

impl AzCount {
    pub const MIN: usize = 1;

    pub const MAX: usize = 6;

    pub fn new(count: usize) -> TopologyResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&count) {
            return Err(TopologyError::InvalidAzCount(count));
        }
        Ok(Self(count))
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for AzCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for AzCount {
    type Error = TopologyError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AzCount> for usize {
    fn from(value: AzCount) -> Self {
        value.0
    }
}

/// Visibility of a subnet group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    /// Routed to an internet gateway, instances receive public addresses
    Public,
    /// Egress through a NAT gateway in a public subnet
    Private,
}

impl SubnetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One subnet group definition: a subnet of this shape is declared in every zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SubnetGroupFields")]
pub struct SubnetGroup {
    name: String,
    subnet_type: SubnetType,
    mask: SubnetMask,
}

/// Unchecked wire form of [`SubnetGroup`]
#[derive(Deserialize)]
struct SubnetGroupFields {
    name: String,
    subnet_type: SubnetType,
    mask: SubnetMask,
}

impl TryFrom<SubnetGroupFields> for SubnetGroup {
    type Error = TopologyError;

    fn try_from(fields: SubnetGroupFields) -> Result<Self, Self::Error> {
        Self::new(fields.name, fields.subnet_type, fields.mask)
    }
}

impl SubnetGroup {
    /// Create a subnet group definition
    ///
    /// # Invariants
    /// - Name is non-empty and alphanumeric (it becomes part of logical ids)
    pub fn new(
        name: impl Into<String>,
        subnet_type: SubnetType,
        mask: SubnetMask,
    ) -> TopologyResult<Self> {
        let name = name.into();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TopologyError::Configuration(format!(
                "Subnet group name must be non-empty and alphanumeric: {:?}",
                name
            )));
        }

        Ok(Self {
            name,
            subnet_type,
            mask,
        })
    }

    /// `/24` group named after its visibility
    pub fn default_of(subnet_type: SubnetType) -> Self {
        Self {
            name: subnet_type.as_str().to_string(),
            subnet_type,
            mask: SubnetMask::DEFAULT,
        }
    }

    pub fn public(name: impl Into<String>, mask: SubnetMask) -> TopologyResult<Self> {
        Self::new(name, SubnetType::Public, mask)
    }

    pub fn private(name: impl Into<String>, mask: SubnetMask) -> TopologyResult<Self> {
        Self::new(name, SubnetType::Private, mask)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subnet_type(&self) -> SubnetType {
        self.subnet_type
    }

    pub fn mask(&self) -> SubnetMask {
        self.mask
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Server Topology Unit
//!
//! Given a declared network, declares:
//!
//! 1. a web-ingress policy open to any IPv4 source on the web port
//! 2. a database-ingress policy open only to holders of the web policy on the
//!    engine port
//! 3. one compute instance per public subnet, in subnet enumeration order
//! 4. one managed database spread across the private subnets
//!
//! The expansion is pure: the same network and config always produce the same
//! [`ServerTopology`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::domain::invariants::validate_server_topology;
use crate::domain::{
    DatabaseEngine, IngressRule, InstanceType, MachineImage, Peer, Port, RemovalPolicy,
};
use crate::errors::{TopologyError, TopologyResult};
use crate::topology::NetworkTopology;

/// Construct name of the web-ingress policy
pub const WEB_POLICY: &str = "WebServerSecurityGroup";

/// Construct name of the database-ingress policy
pub const DATABASE_POLICY: &str = "RDSSecurityGroup";

/// Security policy: an allow-list of inbound rules plus an egress switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    name: String,
    description: String,
    network: String,
    allow_all_outbound: bool,
    ingress: Vec<IngressRule>,
}

impl SecurityPolicy {
    pub fn new(
        name: impl Into<String>,
        network: &NetworkTopology,
        description: impl Into<String>,
        allow_all_outbound: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            network: network.name().to_string(),
            allow_all_outbound,
            ingress: Vec::new(),
        }
    }

    /// Append an inbound rule
    ///
    /// # Rules
    /// - A policy cannot name itself as a source
    /// - The same (source, port) pair is declared at most once
    pub fn add_ingress_rule(
        &mut self,
        peer: Peer,
        port: Port,
        description: impl Into<String>,
    ) -> TopologyResult<()> {
        if let Peer::Policy(source) = &peer {
            if source == &self.name {
                return Err(TopologyError::InvalidIngressRule {
                    policy: self.name.clone(),
                    reason: "a policy cannot admit traffic from itself".to_string(),
                });
            }
        }

        if self
            .ingress
            .iter()
            .any(|rule| rule.peer == peer && rule.port == port)
        {
            return Err(TopologyError::InvalidIngressRule {
                policy: self.name.clone(),
                reason: format!("duplicate rule for {} on {}", peer, port),
            });
        }

        debug!(policy = %self.name, %peer, %port, "Added ingress rule");
        self.ingress.push(IngressRule::new(peer, port, description));
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Network the policy belongs to
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn allows_all_outbound(&self) -> bool {
        self.allow_all_outbound
    }

    pub fn ingress_rules(&self) -> &[IngressRule] {
        &self.ingress
    }

    /// Allow-list evaluation: true only if some rule admits `peer` on TCP `port`
    pub fn permits_tcp(&self, peer: &Peer, port: u16) -> bool {
        self.ingress.iter().any(|rule| rule.allows_tcp(peer, port))
    }
}

/// Web server instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeInstance {
    /// Construct name, e.g. `WebServer1`
    pub name: String,
    pub machine_image: MachineImage,
    pub instance_type: InstanceType,
    /// Name of the subnet the instance is placed in
    pub subnet: String,
    pub zone_index: usize,
    /// Name of the attached policy
    pub security_policy: String,
}

/// Managed relational database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDatabase {
    pub name: String,
    pub engine: DatabaseEngine,
    pub instance_class: InstanceType,
    pub allocated_storage_gb: u32,
    pub master_username: String,
    pub removal_policy: RemovalPolicy,
    /// Names of the subnets the database may be placed in
    pub subnets: Vec<String>,
    /// Names of the attached policies
    pub security_policies: Vec<String>,
}

impl ManagedDatabase {
    pub fn port(&self) -> u16 {
        self.engine.port()
    }
}

/// Declared server stack contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTopology {
    pub web_policy: SecurityPolicy,
    pub database_policy: SecurityPolicy,
    pub instances: Vec<ComputeInstance>,
    pub database: ManagedDatabase,
}

impl ServerTopology {
    /// Policies in declaration order
    pub fn policies(&self) -> [&SecurityPolicy; 2] {
        [&self.web_policy, &self.database_policy]
    }

    pub fn policy(&self, name: &str) -> Option<&SecurityPolicy> {
        self.policies().into_iter().find(|p| p.name() == name)
    }
}

/// Description of the public web rule, naming the protocol for well-known ports
fn web_rule_description(port: u16) -> String {
    match port {
        80 => "Allow inbound HTTP traffic".to_string(),
        443 => "Allow inbound HTTPS traffic".to_string(),
        other => format!("Allow inbound traffic on port {}", other),
    }
}

/// Declare the server topology unit against a declared network
pub fn declare_servers(
    network: &NetworkTopology,
    config: &ServerConfig,
) -> TopologyResult<ServerTopology> {
    config.validate()?;

    let mut web_policy = SecurityPolicy::new(
        WEB_POLICY,
        network,
        "Security group for web servers",
        true,
    );
    web_policy.add_ingress_rule(
        Peer::any_ipv4(),
        Port::tcp(config.web_port)?,
        web_rule_description(config.web_port),
    )?;

    let engine = &config.database.engine;
    let mut database_policy =
        SecurityPolicy::new(DATABASE_POLICY, network, "Security group for RDS", true);
    database_policy.add_ingress_rule(
        Peer::policy(web_policy.name()),
        Port::tcp(engine.port())?,
        format!(
            "Allow inbound {} traffic from web servers",
            engine.kind().display_name()
        ),
    )?;

    let instances: Vec<ComputeInstance> = network
        .public_subnets()
        .into_iter()
        .enumerate()
        .map(|(index, subnet)| ComputeInstance {
            name: format!("WebServer{}", index + 1),
            machine_image: config.machine_image.clone(),
            instance_type: config.instance_type,
            subnet: subnet.name.clone(),
            zone_index: subnet.zone_index,
            security_policy: web_policy.name().to_string(),
        })
        .collect();

    for instance in &instances {
        debug!(
            instance = %instance.name,
            subnet = %instance.subnet,
            instance_type = %instance.instance_type,
            "Declared compute instance"
        );
    }

    let private_subnets = network.private_subnets();
    let zones: std::collections::BTreeSet<usize> =
        private_subnets.iter().map(|s| s.zone_index).collect();
    if zones.len() < 2 {
        warn!(
            zones = zones.len(),
            "Database subnet group spans fewer than two zones; the engine requires two"
        );
    }

    let database = ManagedDatabase {
        name: config.database.name.clone(),
        engine: engine.clone(),
        instance_class: config.database.instance_class,
        allocated_storage_gb: config.database.allocated_storage_gb,
        master_username: config.database.master_username.clone(),
        removal_policy: config.database.removal_policy,
        subnets: private_subnets.iter().map(|s| s.name.clone()).collect(),
        security_policies: vec![database_policy.name().to_string()],
    };

    let servers = ServerTopology {
        web_policy,
        database_policy,
        instances,
        database,
    };

    validate_server_topology(network, &servers)?;

    info!(
        instances = servers.instances.len(),
        database = %servers.database.engine,
        "Declared server topology"
    );

    Ok(servers)
}

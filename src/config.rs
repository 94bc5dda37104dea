// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Configuration
//!
//! Explicit configuration objects for both topology units. `Default`
//! reproduces the reference two-stack topology: a /16 network over two zones
//! with /24 public and private groups, `t2.micro` web servers on port 80, and
//! a MySQL 8.0 database.
//!
//! Every required field is spelled out; nothing is defaulted implicitly at
//! synthesis time. [`TopologyConfig::validate`] runs every construction-time
//! invariant, and [`TopologyConfig::from_env`] layers `TOPOLOGY_*`
//! environment overrides over the defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::domain::{
    AzCount, DatabaseEngine, InstanceClass, InstanceSize, InstanceType, Ipv4Cidr,
    MachineImage, Port, RemovalPolicy, SubnetGroup, SubnetMask, SubnetType,
};
use crate::errors::{TopologyError, TopologyResult};

/// Largest number of subnets `Fn::Cidr` can carve from one block
pub const MAX_SUBNETS: usize = 256;

/// Configuration of the network topology unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Construct name of the network
    pub vpc_name: String,
    /// Network address block
    pub cidr: Ipv4Cidr,
    /// Number of availability zones to span
    pub max_azs: usize,
    /// Subnet groups; one subnet of each per zone
    pub subnet_groups: Vec<SubnetGroup>,
    /// NAT gateway count; `None` means one per zone
    pub nat_gateways: Option<usize>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            vpc_name: "MyVpc".to_string(),
            cidr: Ipv4Cidr::DEFAULT_NETWORK,
            max_azs: 2,
            subnet_groups: vec![
                SubnetGroup::default_of(SubnetType::Public),
                SubnetGroup::default_of(SubnetType::Private),
            ],
            nat_gateways: None,
        }
    }
}

impl NetworkConfig {
    /// Validate construction-time invariants
    ///
    /// # Rules
    /// - Construct name is alphanumeric
    /// - Network block is /16 to /28
    /// - Zone count within [`AzCount`] bounds
    /// - At least one subnet group, names unique
    /// - Private groups require a public group for NAT placement
    /// - No subnet wider than the network block
    /// - Total subnet demand fits the network block and `Fn::Cidr` limits
    pub fn validate(&self) -> TopologyResult<()> {
        validate_construct_name(&self.vpc_name)?;

        let prefix = self.cidr.prefix_len();
        if !(SubnetMask::MIN..=SubnetMask::MAX).contains(&prefix) {
            return Err(TopologyError::InvalidPrefixLength(prefix));
        }

        let az_count = AzCount::new(self.max_azs)?;

        if self.subnet_groups.is_empty() {
            return Err(TopologyError::Configuration(
                "At least one subnet group is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for group in &self.subnet_groups {
            if !seen.insert(group.name()) {
                return Err(TopologyError::DuplicateSubnetGroup(group.name().to_string()));
            }
            if group.mask().value() < prefix {
                return Err(TopologyError::AddressSpaceExhausted {
                    cidr: self.cidr.to_string(),
                    required: group.mask().block_size(),
                    available: self.cidr.num_addresses(),
                });
            }
        }

        let has_public = self
            .subnet_groups
            .iter()
            .any(|g| g.subnet_type() == SubnetType::Public);
        let has_private = self
            .subnet_groups
            .iter()
            .any(|g| g.subnet_type() == SubnetType::Private);
        if has_private && !has_public {
            return Err(TopologyError::MissingPublicSubnets);
        }

        // Every subnet occupies one slot sized for the widest group
        let subnet_count = self.subnet_groups.len() * az_count.value();
        if subnet_count > MAX_SUBNETS {
            return Err(TopologyError::Configuration(format!(
                "{} subnets requested, at most {} supported",
                subnet_count, MAX_SUBNETS
            )));
        }
        let slot = self
            .subnet_groups
            .iter()
            .map(|g| g.mask().block_size())
            .max()
            .unwrap_or(0);
        let required = slot * subnet_count as u64;
        if required > self.cidr.num_addresses() {
            return Err(TopologyError::AddressSpaceExhausted {
                cidr: self.cidr.to_string(),
                required,
                available: self.cidr.num_addresses(),
            });
        }

        Ok(())
    }

    /// Replace every group's mask
    pub fn with_uniform_mask(mut self, mask: SubnetMask) -> TopologyResult<Self> {
        self.subnet_groups = self
            .subnet_groups
            .iter()
            .map(|g| SubnetGroup::new(g.name(), g.subnet_type(), mask))
            .collect::<TopologyResult<Vec<_>>>()?;
        Ok(self)
    }
}

/// Configuration of the managed database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Construct name
    pub name: String,
    pub engine: DatabaseEngine,
    pub instance_class: InstanceType,
    pub allocated_storage_gb: u32,
    pub master_username: String,
    pub removal_policy: RemovalPolicy,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: "MyRDSInstance".to_string(),
            engine: DatabaseEngine::default(),
            instance_class: InstanceType::of(InstanceClass::Standard5, InstanceSize::Large),
            allocated_storage_gb: 100,
            master_username: "admin".to_string(),
            removal_policy: RemovalPolicy::Snapshot,
        }
    }
}

impl DatabaseConfig {
    /// # Rules
    /// - Storage 20-65536 GiB
    /// - Master username starts with a letter, alphanumeric, 1-16 chars
    pub fn validate(&self) -> TopologyResult<()> {
        validate_construct_name(&self.name)?;

        if !(20..=65_536).contains(&self.allocated_storage_gb) {
            return Err(TopologyError::Configuration(format!(
                "Allocated storage must be 20-65536 GiB, got {}",
                self.allocated_storage_gb
            )));
        }

        let user = &self.master_username;
        let starts_alpha = user.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_alpha || user.len() > 16 || !user.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TopologyError::Configuration(format!(
                "Invalid master username: {:?}",
                user
            )));
        }

        Ok(())
    }
}

/// Configuration of the server topology unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the web servers accept traffic on
    pub web_port: u16,
    pub instance_type: InstanceType,
    pub machine_image: MachineImage,
    pub database: DatabaseConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            web_port: 80,
            instance_type: InstanceType::default(),
            machine_image: MachineImage::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> TopologyResult<()> {
        Port::tcp(self.web_port)?;
        self.database.validate()
    }
}

/// Complete two-stack configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub network_stack_name: String,
    pub server_stack_name: String,
    pub network: NetworkConfig,
    pub servers: ServerConfig,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            network_stack_name: "NetworkStack".to_string(),
            server_stack_name: "ServerStack".to_string(),
            network: NetworkConfig::default(),
            servers: ServerConfig::default(),
        }
    }
}

impl TopologyConfig {
    /// Load configuration from environment variables
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `TOPOLOGY_MAX_AZS` | availability-zone count |
    /// | `TOPOLOGY_VPC_CIDR` | network block |
    /// | `TOPOLOGY_SUBNET_MASK` | prefix length of every subnet group |
    /// | `TOPOLOGY_INSTANCE_TYPE` | web server instance type |
    /// | `TOPOLOGY_DB_ENGINE_VERSION` | database engine version |
    pub fn from_env() -> TopologyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> TopologyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(max_azs) = parse_var::<usize>(&lookup, "TOPOLOGY_MAX_AZS")? {
            config.network.max_azs = max_azs;
        }
        if let Some(cidr) = parse_var::<Ipv4Cidr>(&lookup, "TOPOLOGY_VPC_CIDR")? {
            config.network.cidr = cidr;
        }
        if let Some(mask) = parse_var::<u8>(&lookup, "TOPOLOGY_SUBNET_MASK")? {
            config.network = config.network.with_uniform_mask(SubnetMask::new(mask)?)?;
        }
        if let Some(instance_type) = parse_var::<InstanceType>(&lookup, "TOPOLOGY_INSTANCE_TYPE")? {
            config.servers.instance_type = instance_type;
        }
        if let Some(version) = lookup("TOPOLOGY_DB_ENGINE_VERSION") {
            let kind = config.servers.database.engine.kind();
            config.servers.database.engine = DatabaseEngine::new(kind, version.trim())?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate both units and the stack names
    ///
    /// # Rules
    /// - Stack names start with a letter, contain letters, digits and hyphens
    /// - Stack names differ
    /// - The database engine port differs from the web port
    pub fn validate(&self) -> TopologyResult<()> {
        validate_stack_name(&self.network_stack_name)?;
        validate_stack_name(&self.server_stack_name)?;
        if self.network_stack_name == self.server_stack_name {
            return Err(TopologyError::Configuration(format!(
                "Network and server stacks share the name {}",
                self.network_stack_name
            )));
        }

        self.network.validate()?;
        self.servers.validate()?;

        if self.servers.database.engine.port() == self.servers.web_port {
            return Err(TopologyError::Configuration(format!(
                "Web port {} collides with the {} port",
                self.servers.web_port,
                self.servers.database.engine.kind()
            )));
        }

        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> TopologyResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TopologyError::Configuration(format!("{}={:?}: {}", key, raw, e))),
    }
}

fn validate_stack_name(name: &str) -> TopologyResult<()> {
    let starts_alpha = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !starts_alpha || !valid_chars || name.len() > 128 {
        return Err(TopologyError::Configuration(format!(
            "Invalid stack name: {:?}",
            name
        )));
    }
    Ok(())
}

fn validate_construct_name(name: &str) -> TopologyResult<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TopologyError::Configuration(format!(
            "Construct names must be non-empty and alphanumeric: {:?}",
            name
        )));
    }
    Ok(())
}

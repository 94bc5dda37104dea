// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Topology Unit
//!
//! Expands a [`NetworkConfig`] into one virtual network: for every
//! availability zone, one subnet per subnet group. Subnets are enumerated
//! group-major (every zone of the first group, then every zone of the
//! second), and that enumeration order is what downstream units iterate.
//!
//! Address blocks are not computed here. Each subnet gets a *slot*: its index
//! in the enumeration. The engine carves the network block into equal slots
//! sized for the widest group and places each subnet at the start of its slot.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::domain::{AzCount, Ipv4Cidr, SubnetGroup, SubnetMask, SubnetType};
use crate::errors::{TopologyError, TopologyResult};

/// One declared subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    /// Construct name, e.g. `PublicSubnet1`
    pub name: String,
    /// Owning subnet group
    pub group: String,
    pub subnet_type: SubnetType,
    pub mask: SubnetMask,
    /// Zero-based availability-zone index
    pub zone_index: usize,
    /// Position in the network's enumeration order
    pub slot: usize,
}

impl Subnet {
    pub fn is_public(&self) -> bool {
        self.subnet_type.is_public()
    }
}

/// Declared virtual network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTopology {
    name: String,
    cidr: Ipv4Cidr,
    az_count: AzCount,
    groups: Vec<SubnetGroup>,
    subnets: Vec<Subnet>,
    nat_gateways: usize,
    slot_mask: SubnetMask,
}

impl NetworkTopology {
    /// Construct name of the network
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    pub fn az_count(&self) -> usize {
        self.az_count.value()
    }

    pub fn subnet_groups(&self) -> &[SubnetGroup] {
        &self.groups
    }

    /// All subnets in enumeration order
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn subnets_of_type(&self, subnet_type: SubnetType) -> impl Iterator<Item = &Subnet> {
        self.subnets
            .iter()
            .filter(move |s| s.subnet_type == subnet_type)
    }

    pub fn public_subnets(&self) -> Vec<&Subnet> {
        self.subnets_of_type(SubnetType::Public).collect()
    }

    pub fn private_subnets(&self) -> Vec<&Subnet> {
        self.subnets_of_type(SubnetType::Private).collect()
    }

    pub fn subnet(&self, name: &str) -> Option<&Subnet> {
        self.subnets.iter().find(|s| s.name == name)
    }

    /// Number of NAT gateways (zero when there are no private subnets)
    pub fn nat_gateways(&self) -> usize {
        self.nat_gateways
    }

    /// Public subnets hosting a NAT gateway, in zone order
    pub fn nat_subnets(&self) -> Vec<&Subnet> {
        let Some(first_public) = self.groups.iter().find(|g| g.subnet_type().is_public()) else {
            return Vec::new();
        };

        self.subnets
            .iter()
            .filter(|s| s.group == first_public.name())
            .take(self.nat_gateways)
            .collect()
    }

    /// NAT gateway subnet serving a private subnet in `zone_index`
    ///
    /// Zones without their own NAT gateway share one round-robin.
    pub fn nat_subnet_for_zone(&self, zone_index: usize) -> Option<&Subnet> {
        let nat_subnets = self.nat_subnets();
        if nat_subnets.is_empty() {
            return None;
        }
        let chosen = nat_subnets
            .iter()
            .find(|s| s.zone_index == zone_index)
            .unwrap_or(&nat_subnets[zone_index % nat_subnets.len()]);
        Some(*chosen)
    }

    /// Slot size: the widest mask among the groups
    pub fn slot_mask(&self) -> SubnetMask {
        self.slot_mask
    }
}

/// Declare the network topology unit
pub fn declare_network(config: &NetworkConfig) -> TopologyResult<NetworkTopology> {
    config.validate()?;

    let az_count = AzCount::new(config.max_azs)?;
    let slot_mask = config
        .subnet_groups
        .iter()
        .map(SubnetGroup::mask)
        .min()
        .ok_or_else(|| TopologyError::Configuration("No subnet groups configured".to_string()))?;
    let has_private = config
        .subnet_groups
        .iter()
        .any(|g| g.subnet_type() == SubnetType::Private);

    let mut subnets = Vec::with_capacity(config.subnet_groups.len() * az_count.value());
    for group in &config.subnet_groups {
        for zone_index in 0..az_count.value() {
            let subnet = Subnet {
                name: format!("{}Subnet{}", group.name(), zone_index + 1),
                group: group.name().to_string(),
                subnet_type: group.subnet_type(),
                mask: group.mask(),
                zone_index,
                slot: subnets.len(),
            };
            debug!(
                subnet = %subnet.name,
                zone = zone_index,
                mask = %subnet.mask,
                "Declared subnet"
            );
            subnets.push(subnet);
        }
    }

    let nat_gateways = if has_private {
        let requested = config.nat_gateways.unwrap_or(az_count.value());
        if requested == 0 {
            return Err(TopologyError::Configuration(
                "Private subnet groups need at least one NAT gateway".to_string(),
            ));
        }
        if requested > az_count.value() {
            warn!(
                requested,
                available = az_count.value(),
                "More NAT gateways requested than public subnets, capping"
            );
        }
        requested.min(az_count.value())
    } else {
        0
    };

    info!(
        network = %config.vpc_name,
        cidr = %config.cidr,
        azs = az_count.value(),
        subnets = subnets.len(),
        nat_gateways,
        "Declared network topology"
    );

    Ok(NetworkTopology {
        name: config.vpc_name.clone(),
        cidr: config.cidr,
        az_count,
        groups: config.subnet_groups.clone(),
        subnets,
        nat_gateways,
        slot_mask,
    })
}

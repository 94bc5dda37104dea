// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! Business rules that span more than one value object. Every function is
//! pure and deterministic, and returns a [`ValidationResult`] describing the
//! first violated rule.
//!
//! # Invariant Categories
//!
//! 1. **Network Invariants**: one subnet per group per zone
//! 2. **Placement Invariants**: instances in public subnets, database in private
//! 3. **Policy Invariants**: database reachable only through the web policy

use std::collections::BTreeSet;

use crate::domain::Peer;
use crate::topology::{ManagedDatabase, NetworkTopology, ServerTopology};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A subnet group does not cover every zone exactly once
    #[error("Subnet group {group} has {actual} subnets, expected {expected}")]
    SubnetsPerZone {
        group: String,
        expected: usize,
        actual: usize,
    },

    /// Instance count does not match the public subnet count
    #[error("Expected {expected} instances, declared {actual}")]
    InstanceCount { expected: usize, actual: usize },

    /// Instance placed outside a public subnet
    #[error("Instance {instance} is not placed in a public subnet ({subnet})")]
    InstancePlacement { instance: String, subnet: String },

    /// Database subnet set is empty or reaches outside private subnets
    #[error("Invalid database placement: {0}")]
    DatabasePlacement(String),

    /// Policy constraint violation
    #[error("Policy constraint violated: {0}")]
    PolicyViolation(String),

    /// Business rule violation
    #[error("Business rule violated: {0}")]
    BusinessRule(String),
}

/// Validate that every subnet group has one subnet in each zone
///
/// # Rules
/// - Subnet count per group equals the zone count
/// - No zone appears twice within a group
pub fn validate_one_subnet_per_zone(network: &NetworkTopology) -> ValidationResult {
    for group in network.subnet_groups() {
        let zones: Vec<usize> = network
            .subnets()
            .iter()
            .filter(|s| s.group == group.name())
            .map(|s| s.zone_index)
            .collect();

        if zones.len() != network.az_count() {
            return Err(ValidationError::SubnetsPerZone {
                group: group.name().to_string(),
                expected: network.az_count(),
                actual: zones.len(),
            });
        }

        let distinct: BTreeSet<usize> = zones.iter().copied().collect();
        if distinct.len() != zones.len() {
            return Err(ValidationError::BusinessRule(format!(
                "Subnet group {} places two subnets in the same zone",
                group.name()
            )));
        }
    }
    Ok(())
}

/// Validate web server placement
///
/// # Rules
/// - Exactly one instance per public subnet
/// - Every instance sits in a distinct public subnet of the network
pub fn validate_instance_placement(
    network: &NetworkTopology,
    servers: &ServerTopology,
) -> ValidationResult {
    let public = network.public_subnets();
    if servers.instances.len() != public.len() {
        return Err(ValidationError::InstanceCount {
            expected: public.len(),
            actual: servers.instances.len(),
        });
    }

    let mut used = BTreeSet::new();
    for instance in &servers.instances {
        let is_public = network
            .subnet(&instance.subnet)
            .is_some_and(|subnet| subnet.is_public());
        if !is_public || !used.insert(instance.subnet.as_str()) {
            return Err(ValidationError::InstancePlacement {
                instance: instance.name.clone(),
                subnet: instance.subnet.clone(),
            });
        }
    }
    Ok(())
}

/// Validate database placement
///
/// # Rules
/// - At least one subnet
/// - Only private subnets of the network
pub fn validate_database_placement(
    network: &NetworkTopology,
    database: &ManagedDatabase,
) -> ValidationResult {
    if database.subnets.is_empty() {
        return Err(ValidationError::DatabasePlacement(format!(
            "{} has no private subnets to be placed in",
            database.name
        )));
    }

    for name in &database.subnets {
        match network.subnet(name) {
            Some(subnet) if !subnet.is_public() => {}
            Some(_) => {
                return Err(ValidationError::DatabasePlacement(format!(
                    "{} would be placed in public subnet {}",
                    database.name, name
                )))
            }
            None => {
                return Err(ValidationError::DatabasePlacement(format!(
                    "{} references unknown subnet {}",
                    database.name, name
                )))
            }
        }
    }
    Ok(())
}

/// Validate security policy isolation
///
/// # Rules
/// - Every policy-sourced rule names a policy of this topology
/// - The database policy admits no address-range sources
/// - The database policy admits the web policy on the engine port
pub fn validate_policy_isolation(servers: &ServerTopology) -> ValidationResult {
    for policy in servers.policies() {
        for rule in policy.ingress_rules() {
            if let Peer::Policy(source) = &rule.peer {
                if servers.policy(source).is_none() {
                    return Err(ValidationError::PolicyViolation(format!(
                        "{} admits unknown policy {}",
                        policy.name(),
                        source
                    )));
                }
            }
        }
    }

    let db_policy = &servers.database_policy;
    if db_policy.ingress_rules().iter().any(|rule| rule.peer.is_any()) {
        return Err(ValidationError::PolicyViolation(format!(
            "{} must not admit traffic from any address",
            db_policy.name()
        )));
    }

    let web_peer = Peer::policy(servers.web_policy.name());
    if !db_policy.permits_tcp(&web_peer, servers.database.port()) {
        return Err(ValidationError::PolicyViolation(format!(
            "{} does not admit {} on port {}",
            db_policy.name(),
            servers.web_policy.name(),
            servers.database.port()
        )));
    }

    Ok(())
}

/// Composite validation of a declared server topology against its network
pub fn validate_server_topology(
    network: &NetworkTopology,
    servers: &ServerTopology,
) -> ValidationResult {
    validate_one_subnet_per_zone(network)?;
    validate_instance_placement(network, servers)?;
    validate_database_placement(network, &servers.database)?;
    validate_policy_isolation(servers)?;
    Ok(())
}

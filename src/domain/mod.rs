// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Value objects with validation invariants for the two-stack topology,
//! plus the pure business-rule functions that span them.
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Cidr`] - IPv4 block with no host bits set
//! - [`SubnetMask`] - Subnet prefix length (/16 to /28)
//! - [`AzCount`] - Availability-zone count (1-6)
//! - [`SubnetGroup`] - Named subnet shape repeated in every zone
//! - [`Port`] - Protocol plus port range
//! - [`Peer`] - Traffic source of an ingress rule
//! - [`InstanceType`] - Instance class and size, e.g. `t2.micro`
//! - [`MachineImage`] - Latest Amazon Linux or a fixed image id
//! - [`DatabaseEngine`] - Engine family with a supported version
//! - [`ResourceType`] - Provider resource taxonomy
//!
//! # Invariants
//!
//! See [`invariants`] for the cross-object rules checked after expansion.

pub mod compute;
pub mod database;
pub mod invariants;
pub mod network;
pub mod resource_type;
pub mod security;

// Re-export value objects
pub use compute::{AmazonLinuxGeneration, InstanceClass, InstanceSize, InstanceType, MachineImage};
pub use database::{DatabaseEngine, EngineKind, RemovalPolicy};
pub use invariants::{ValidationError, ValidationResult};
pub use network::{AzCount, Ipv4Cidr, SubnetGroup, SubnetMask, SubnetType};
pub use resource_type::{ResourceCategory, ResourceType};
pub use security::{IngressRule, Peer, Port, Protocol};

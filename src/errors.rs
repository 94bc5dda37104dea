// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology declaration and synthesis

use thiserror::Error;

use crate::domain::invariants::ValidationError;

/// Errors that can occur while declaring or synthesizing a topology
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Malformed CIDR block
    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    /// Prefix length outside the allowed range
    #[error("Invalid prefix length: /{0}")]
    InvalidPrefixLength(u8),

    /// Availability-zone count outside the supported range
    #[error("Invalid availability zone count: {0} (must be {min}-{max})", min = crate::domain::AzCount::MIN, max = crate::domain::AzCount::MAX)]
    InvalidAzCount(usize),

    /// Subnet mask outside the range the provider accepts
    #[error("Invalid subnet mask: /{0} (must be /16-/28)")]
    InvalidSubnetMask(u8),

    /// Two subnet groups share a name
    #[error("Duplicate subnet group name: {0}")]
    DuplicateSubnetGroup(String),

    /// Private subnets were requested without any public subnet for NAT placement
    #[error("Private subnet groups require at least one public subnet group for NAT gateways")]
    MissingPublicSubnets,

    /// Requested subnets do not fit in the network block
    #[error("Address space exhausted: {required} addresses requested, {available} available in {cidr}")]
    AddressSpaceExhausted {
        cidr: String,
        required: u64,
        available: u64,
    },

    /// Port range is empty or zero
    #[error("Invalid port range: {from}-{to}")]
    InvalidPort { from: u16, to: u16 },

    /// Instance type string could not be parsed
    #[error("Invalid instance type: {0}")]
    InvalidInstanceType(String),

    /// Database engine version could not be parsed or is unsupported
    #[error("Invalid engine version: {0}")]
    InvalidEngineVersion(String),

    /// Inbound rule rejected by the owning policy
    #[error("Invalid ingress rule on {policy}: {reason}")]
    InvalidIngressRule { policy: String, reason: String },

    /// Logical id already present in a template
    #[error("Duplicate logical id in {stack}: {logical_id}")]
    DuplicateLogicalId { stack: String, logical_id: String },

    /// Structural invariant failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error while writing the assembly
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TopologyError {
    fn from(err: std::io::Error) -> Self {
        TopologyError::Io(err.to_string())
    }
}

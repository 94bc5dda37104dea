// Copyright (c) 2025 - Cowboy AI, Inc.
//! Two-stack cloud topology synthesis
//!
//! Declares a network stack (one VPC with public and private subnets in every
//! availability zone) and a server stack (web servers, a managed database,
//! and the security groups binding them), then synthesizes both into
//! CloudFormation templates plus a cloud-assembly manifest.
//!
//! ```rust
//! use cloud_topology::{synthesize, TopologyConfig};
//!
//! let assembly = synthesize(&TopologyConfig::default()).unwrap();
//! assert_eq!(assembly.manifest().stack_order(), vec!["NetworkStack", "ServerStack"]);
//! ```
//!
//! Provisioning, drift and address allocation stay with the engine that
//! deploys the assembly.

pub mod config;
pub mod domain;
pub mod errors;
pub mod synth;
pub mod template;
pub mod topology;

// Re-export commonly used types
pub use config::{DatabaseConfig, NetworkConfig, ServerConfig, TopologyConfig};
pub use errors::{TopologyError, TopologyResult};
pub use synth::{synthesize, synthesize_run, CloudAssembly, Manifest, StackArtifact, SynthesisRun};
pub use template::{Intrinsic, Template};
pub use topology::{declare_network, declare_servers, NetworkTopology, ServerTopology};

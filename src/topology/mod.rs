// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Units
//!
//! Pure expansion of configuration into declared resources. Neither unit
//! knows about templates: they produce plain data that the synthesis engine
//! renders.
//!
//! - [`declare_network`] - network stack contents
//! - [`declare_servers`] - server stack contents, bound to a declared network

pub mod network;
pub mod server;

pub use network::{declare_network, NetworkTopology, Subnet};
pub use server::{
    declare_servers, ComputeInstance, ManagedDatabase, SecurityPolicy, ServerTopology,
    DATABASE_POLICY, WEB_POLICY,
};

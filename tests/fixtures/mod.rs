// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cloud-topology
//!
//! Deterministic configurations and synthesis runs shared by the integration
//! tests. Run ids and timestamps are fixed constants so two syntheses of the
//! same configuration are byte-identical.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cloud_topology::domain::{DatabaseEngine, SubnetGroup, SubnetMask};
use cloud_topology::{synthesize_run, CloudAssembly, SynthesisRun, TopologyConfig};

// Fixed run id (UUID v7 layout, deterministic for testing)
pub const RUN_ID: &str = "01934f4a-0001-7000-8000-000000000001";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub const NETWORK_STACK: &str = "NetworkStack";
pub const SERVER_STACK: &str = "ServerStack";

/// Synthesis run with fixed identity
pub fn fixed_run() -> SynthesisRun {
    let id = Uuid::parse_str(RUN_ID).expect("Invalid UUID in test fixture");
    let started_at = DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc);
    SynthesisRun::new(id, started_at)
}

/// The reference topology: two zones, /24 subnets, MySQL 8.0
pub fn default_config() -> TopologyConfig {
    TopologyConfig::default()
}

/// Default topology spread over `azs` zones
pub fn config_with_azs(azs: usize) -> TopologyConfig {
    let mut config = TopologyConfig::default();
    config.network.max_azs = azs;
    config
}

/// PostgreSQL instead of MySQL
pub fn postgres_config() -> TopologyConfig {
    let mut config = TopologyConfig::default();
    config.servers.database.engine = DatabaseEngine::postgres("15.4").expect("Invalid engine");
    config
}

/// Narrow public subnets next to wide private ones
pub fn mixed_mask_config() -> TopologyConfig {
    let mut config = TopologyConfig::default();
    config.network.subnet_groups = vec![
        SubnetGroup::public("Public", SubnetMask::new(26).expect("Invalid mask"))
            .expect("Invalid group"),
        SubnetGroup::private("Private", SubnetMask::new(22).expect("Invalid mask"))
            .expect("Invalid group"),
    ];
    config
}

/// Synthesize under the fixed run
pub fn synth(config: &TopologyConfig) -> CloudAssembly {
    synthesize_run(config, fixed_run()).expect("Fixture configuration must synthesize")
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Topology Synthesizer
//!
//! Declares the network and server stacks, synthesizes them, and writes the
//! cloud assembly for the provisioning engine to deploy.
//!
//! Run with: cargo run --bin cloud-topology-synth
//!
//! Environment:
//! - `TOPOLOGY_OUTDIR` - assembly directory (default: `cdk.out`)
//! - `TOPOLOGY_MAX_AZS`, `TOPOLOGY_VPC_CIDR`, `TOPOLOGY_SUBNET_MASK`,
//!   `TOPOLOGY_INSTANCE_TYPE`, `TOPOLOGY_DB_ENGINE_VERSION` - topology overrides
//! - `RUST_LOG` - log filter

use anyhow::{Context, Result};
use cloud_topology::{synthesize, TopologyConfig};
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Starting cloud topology synthesis");

    let outdir = PathBuf::from(std::env::var("TOPOLOGY_OUTDIR").unwrap_or_else(|_| "cdk.out".to_string()));

    let config = TopologyConfig::from_env().context("Invalid topology configuration")?;
    info!("📋 Configuration loaded:");
    info!("  - Network: {} ({})", config.network.vpc_name, config.network.cidr);
    info!("  - Availability zones: {}", config.network.max_azs);
    info!("  - Instance type: {}", config.servers.instance_type);
    info!("  - Database: {}", config.servers.database.engine);

    let assembly = synthesize(&config).context("Synthesis failed")?;

    let written = assembly
        .write_to(&outdir)
        .with_context(|| format!("Failed to write cloud assembly to {}", outdir.display()))?;

    for stack in assembly.stacks() {
        info!(
            "✅ {} ({} resources)",
            stack.name(),
            stack.template().resources().len()
        );
    }
    info!(
        "📦 Wrote {} files to {} (run {})",
        written.len(),
        outdir.display(),
        assembly.run().id
    );

    Ok(())
}

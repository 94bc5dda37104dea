// Copyright (c) 2025 - Cowboy AI, Inc.
//! Synthesis Engine
//!
//! Turns a [`TopologyConfig`] into a [`CloudAssembly`]: one template per
//! stack plus the manifest the provisioning engine reads. Synthesis is a
//! single pure pass:
//!
//! ```text
//! TopologyConfig
//!   → declare_network  → NetworkTopology ─┐
//!   → declare_servers  → ServerTopology  ─┤
//!   → render network stack (+ exports)    │
//!   → render server stack (imports) ←─────┘
//!   → assemble (dependency order)
//! ```
//!
//! Nothing is global: configuration goes in, the assembly comes out.

pub mod assembly;
pub mod network;
pub mod server;

pub use assembly::{CloudAssembly, Manifest, StackArtifact, SynthesisRun};
pub use network::NetworkExports;

use serde_json::{json, Value};
use tracing::{debug, info, info_span};

use crate::config::TopologyConfig;
use crate::errors::TopologyResult;
use crate::template::{logical_id, Resource, Template};
use crate::topology::{declare_network, declare_servers};

/// Synthesize both stacks from configuration
pub fn synthesize(config: &TopologyConfig) -> TopologyResult<CloudAssembly> {
    synthesize_run(config, SynthesisRun::start())
}

/// Synthesize under a caller-supplied run identity
pub fn synthesize_run(config: &TopologyConfig, run: SynthesisRun) -> TopologyResult<CloudAssembly> {
    let span = info_span!("synthesize", run_id = %run.id);
    let _guard = span.enter();

    config.validate()?;

    let network = declare_network(&config.network)?;
    let servers = declare_servers(&network, &config.servers)?;

    let (network_template, exports) = network::render(&config.network_stack_name, &network)?;
    let server_template =
        server::render(&config.server_stack_name, &network, &servers, &exports)?;

    let assembly = CloudAssembly::assemble(run, vec![network_template, server_template])?;

    info!(
        stacks = assembly.stacks().len(),
        resources = assembly
            .stacks()
            .iter()
            .map(|s| s.template().resources().len())
            .sum::<usize>(),
        "Synthesis complete"
    );

    Ok(assembly)
}

/// Template under construction, allocating logical ids from construct paths
pub(crate) struct StackBuilder {
    template: Template,
}

impl StackBuilder {
    pub(crate) fn new(stack_name: &str, description: impl Into<String>) -> Self {
        Self {
            template: Template::new(stack_name, description),
        }
    }

    pub(crate) fn stack_name(&self) -> &str {
        self.template.stack_name()
    }

    /// Add `resource` at construct `path`, returning its logical id
    pub(crate) fn add(&mut self, path: &[&str], resource: Resource) -> TopologyResult<String> {
        let id = logical_id(path);
        debug!(
            stack = %self.stack_name(),
            logical_id = %id,
            resource_type = %resource.type_name(),
            category = ?resource.resource_type().map(|t| t.category()),
            "Rendered resource"
        );
        self.template.add_resource(id.clone(), resource)?;
        Ok(id)
    }

    /// `Name` tag carrying the construct path, e.g. `NetworkStack/MyVpc`
    pub(crate) fn name_tag(&self, path: &[&str]) -> Value {
        json!({ "Key": "Name", "Value": format!("{}/{}", self.stack_name(), path.join("/")) })
    }

    pub(crate) fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }

    pub(crate) fn finish(self) -> Template {
        self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use crate::errors::TopologyError;

    #[test]
    fn test_default_synthesis() {
        let assembly = synthesize(&TopologyConfig::default()).unwrap();
        let names: Vec<&str> = assembly.stacks().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["NetworkStack", "ServerStack"]);
    }

    #[test]
    fn test_invalid_config_fails_synthesis() {
        let mut config = TopologyConfig::default();
        config.network.max_azs = 0;
        assert_eq!(
            synthesize(&config).unwrap_err(),
            TopologyError::InvalidAzCount(0)
        );
    }

    #[test]
    fn test_builder_rejects_path_collision() {
        let mut builder = StackBuilder::new("S", "test");
        builder
            .add(&["Vpc", "Resource"], Resource::new(ResourceType::Vpc))
            .unwrap();
        assert!(builder
            .add(&["Vpc", "Resource"], Resource::new(ResourceType::Vpc))
            .is_err());
    }

    #[test]
    fn test_name_tag() {
        let builder = StackBuilder::new("NetworkStack", "test");
        assert_eq!(
            builder.name_tag(&["MyVpc", "PublicSubnet1"])["Value"],
            "NetworkStack/MyVpc/PublicSubnet1"
        );
    }
}

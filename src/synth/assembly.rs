// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Assembly
//!
//! The synthesized output: ordered stack artifacts plus the manifest the
//! provisioning engine reads to deploy them. On disk an assembly is a
//! directory holding:
//!
//! - `<Stack>.template.json` for every stack
//! - `manifest.json` listing the stacks and their dependencies
//! - `cdk.out` with the assembly schema version
//! - `synthesis.json` with the run id and timestamp
//!
//! Stacks are ordered so that every stack comes after the stacks whose
//! exports it imports.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{TopologyError, TopologyResult};
use crate::template::Template;

/// Cloud assembly schema version
pub const SCHEMA_VERSION: &str = "21.0.0";

/// Artifact type of a deployable stack
pub const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";

/// Environment of stacks not bound to an account or region
pub const AGNOSTIC_ENVIRONMENT: &str = "aws://unknown-account/unknown-region";

pub const MANIFEST_FILE: &str = "manifest.json";

/// Identity of one synthesis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRun {
    #[serde(rename = "runId")]
    pub id: Uuid,
    #[serde(rename = "timestamp")]
    pub started_at: DateTime<Utc>,
}

impl SynthesisRun {
    /// New run with a time-ordered id
    pub fn start() -> Self {
        Self {
            id: Uuid::now_v7(),
            started_at: Utc::now(),
        }
    }

    pub fn new(id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self { id, started_at }
    }
}

/// One deployable stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackArtifact {
    name: String,
    template: Template,
    dependencies: Vec<String>,
}

impl StackArtifact {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Stacks that must be deployed first
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn template_file(&self) -> String {
        format!("{}.template.json", self.name)
    }
}

/// Synthesized stacks in deployment order
#[derive(Debug, Clone, PartialEq)]
pub struct CloudAssembly {
    run: SynthesisRun,
    stacks: Vec<StackArtifact>,
}

impl CloudAssembly {
    /// Assemble templates into dependency order
    ///
    /// # Rules
    /// - Stack names are unique
    /// - Every imported value is exported by exactly one other stack
    /// - Dependencies form no cycle
    pub fn assemble(run: SynthesisRun, templates: Vec<Template>) -> TopologyResult<Self> {
        let mut exporters: HashMap<String, String> = HashMap::new();
        for template in &templates {
            for export in template.export_names() {
                if let Some(previous) = exporters.insert(export.clone(), template.stack_name().to_string()) {
                    return Err(TopologyError::Configuration(format!(
                        "Export {} is declared by both {} and {}",
                        export,
                        previous,
                        template.stack_name()
                    )));
                }
            }
        }

        let mut pending: Vec<StackArtifact> = Vec::with_capacity(templates.len());
        for template in templates {
            let name = template.stack_name().to_string();
            if pending.iter().any(|s| s.name == name) {
                return Err(TopologyError::Configuration(format!(
                    "Duplicate stack name {}",
                    name
                )));
            }

            let mut dependencies = Vec::new();
            for import in template.imported_values() {
                let owner = exporters.get(&import).ok_or_else(|| {
                    TopologyError::Configuration(format!(
                        "{} imports {} which no stack exports",
                        name, import
                    ))
                })?;
                if owner == &name {
                    return Err(TopologyError::Configuration(format!(
                        "{} imports its own export {}",
                        name, import
                    )));
                }
                if !dependencies.contains(owner) {
                    dependencies.push(owner.clone());
                }
            }

            debug!(stack = %name, dependencies = ?dependencies, "Resolved stack dependencies");
            pending.push(StackArtifact {
                name,
                template,
                dependencies,
            });
        }

        // Stable topological order: repeatedly take the first ready stack
        let mut stacks: Vec<StackArtifact> = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|candidate| {
                candidate
                    .dependencies
                    .iter()
                    .all(|dep| stacks.iter().any(|placed| &placed.name == dep))
            });
            match ready {
                Some(index) => stacks.push(pending.remove(index)),
                None => {
                    let names: Vec<&str> = pending.iter().map(|s| s.name.as_str()).collect();
                    return Err(TopologyError::Configuration(format!(
                        "Cyclic stack dependencies among {}",
                        names.join(", ")
                    )));
                }
            }
        }

        Ok(Self { run, stacks })
    }

    pub fn run(&self) -> &SynthesisRun {
        &self.run
    }

    /// Stacks in deployment order
    pub fn stacks(&self) -> &[StackArtifact] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Option<&StackArtifact> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// Render `manifest.json`
    pub fn manifest(&self) -> Manifest {
        let artifacts = self
            .stacks
            .iter()
            .map(|stack| {
                let artifact = ArtifactManifest {
                    artifact_type: STACK_ARTIFACT_TYPE.to_string(),
                    environment: AGNOSTIC_ENVIRONMENT.to_string(),
                    properties: StackProperties {
                        template_file: stack.template_file(),
                    },
                    dependencies: stack.dependencies.clone(),
                    display_name: stack.name.clone(),
                };
                (stack.name.clone(), artifact)
            })
            .collect();

        Manifest {
            version: SCHEMA_VERSION.to_string(),
            artifacts,
        }
    }

    /// Write the assembly into `dir`, creating it if needed
    ///
    /// Returns the written paths in write order.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> TopologyResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(self.stacks.len() + 3);
        for stack in &self.stacks {
            let path = dir.join(stack.template_file());
            fs::write(&path, stack.template.to_json_pretty()?)?;
            info!(
                stack = %stack.name,
                resources = stack.template.resources().len(),
                path = %path.display(),
                "Wrote template"
            );
            written.push(path);
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, serde_json::to_string_pretty(&self.manifest())?)?;
        written.push(manifest_path);

        let version_path = dir.join("cdk.out");
        fs::write(
            &version_path,
            serde_json::to_string(&serde_json::json!({ "version": SCHEMA_VERSION }))?,
        )?;
        written.push(version_path);

        let run_path = dir.join("synthesis.json");
        fs::write(&run_path, serde_json::to_string_pretty(&self.run)?)?;
        written.push(run_path);

        info!(
            run_id = %self.run.id,
            dir = %dir.display(),
            files = written.len(),
            "Wrote cloud assembly"
        );
        Ok(written)
    }
}

/// `manifest.json` contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub artifacts: IndexMap<String, ArtifactManifest>,
}

impl Manifest {
    /// Artifact names in deployment order
    pub fn stack_order(&self) -> Vec<&str> {
        self.artifacts.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactManifest {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub environment: String,
    pub properties: StackProperties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackProperties {
    pub template_file: String,
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! CloudFormation Template Model
//!
//! A [`Template`] is the native document of the provisioning engine: format
//! version, description, parameters, resources, outputs. Every section keeps
//! insertion order so the same declaration always serializes byte-for-byte
//! the same.
//!
//! ```rust
//! use cloud_topology::domain::ResourceType;
//! use cloud_topology::template::{Intrinsic, Resource, Template};
//!
//! let mut template = Template::new("Demo", "Example stack");
//! template
//!     .add_resource(
//!         "Vpc",
//!         Resource::new(ResourceType::Vpc).property("CidrBlock", "10.0.0.0/16"),
//!     )
//!     .unwrap();
//! template
//!     .add_resource(
//!         "Igw",
//!         Resource::new(ResourceType::InternetGateway)
//!             .property("Tags", serde_json::json!([]))
//!             .depends_on("Vpc"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(template.resources_of_type(ResourceType::Vpc).len(), 1);
//! assert_eq!(Intrinsic::reference("Vpc").to_value()["Ref"], "Vpc");
//! ```

pub mod intrinsic;
pub mod logical_id;

pub use intrinsic::Intrinsic;
pub use logical_id::logical_id;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{RemovalPolicy, ResourceType};
use crate::errors::{TopologyError, TopologyResult};

/// Template format version the engine accepts
pub const FORMAT_VERSION: &str = "2010-09-09";

/// One stack's template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(skip)]
    stack_name: String,
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    parameters: IndexMap<String, Parameter>,
    resources: IndexMap<String, Resource>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    outputs: IndexMap<String, Output>,
}

impl Template {
    pub fn new(stack_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            format_version: FORMAT_VERSION.to_string(),
            description: Some(description.into()),
            parameters: IndexMap::new(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Name of the stack the template deploys
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Add a resource under a fresh logical id
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        resource: Resource,
    ) -> TopologyResult<()> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(TopologyError::DuplicateLogicalId {
                stack: self.stack_name.clone(),
                logical_id,
            });
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    /// Add a parameter; re-adding an identical parameter is a no-op
    pub fn add_parameter(
        &mut self,
        logical_id: impl Into<String>,
        parameter: Parameter,
    ) -> TopologyResult<()> {
        let logical_id = logical_id.into();
        match self.parameters.get(&logical_id) {
            Some(existing) if existing == &parameter => Ok(()),
            Some(_) => Err(TopologyError::DuplicateLogicalId {
                stack: self.stack_name.clone(),
                logical_id,
            }),
            None => {
                self.parameters.insert(logical_id, parameter);
                Ok(())
            }
        }
    }

    pub fn add_output(&mut self, logical_id: impl Into<String>, output: Output) -> TopologyResult<()> {
        let logical_id = logical_id.into();
        if self.outputs.contains_key(&logical_id) {
            return Err(TopologyError::DuplicateLogicalId {
                stack: self.stack_name.clone(),
                logical_id,
            });
        }
        self.outputs.insert(logical_id, output);
        Ok(())
    }

    pub fn resources(&self) -> &IndexMap<String, Resource> {
        &self.resources
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    pub fn outputs(&self) -> &IndexMap<String, Output> {
        &self.outputs
    }

    /// Resources of one type, in insertion order
    pub fn resources_of_type(&self, resource_type: ResourceType) -> Vec<(&str, &Resource)> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type() == Some(resource_type))
            .map(|(id, r)| (id.as_str(), r))
            .collect()
    }

    /// Export names this template imports, deduplicated, in first-use order
    pub fn imported_values(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for resource in self.resources.values() {
            for name in intrinsic::imported_names(&Value::Object(resource.properties.clone())) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Names of the values this template exports
    pub fn export_names(&self) -> Vec<String> {
        self.outputs
            .values()
            .filter_map(|o| o.export.as_ref().map(|e| e.name.clone()))
            .collect()
    }

    /// Logical ids referenced by `Ref`/`Fn::GetAtt` that are neither resources
    /// nor parameters
    pub fn dangling_references(&self) -> Vec<String> {
        let mut dangling = Vec::new();
        let values = self
            .resources
            .values()
            .map(|r| Value::Object(r.properties.clone()))
            .chain(self.outputs.values().map(|o| o.value.clone()));
        for value in values {
            for id in intrinsic::referenced_ids(&value) {
                let known = self.resources.contains_key(&id)
                    || self.parameters.contains_key(&id)
                    || id.starts_with("AWS::");
                if !known && !dangling.contains(&id) {
                    dangling.push(id);
                }
            }
        }
        for resource in self.resources.values() {
            for id in &resource.depends_on {
                if !self.resources.contains_key(id) && !dangling.contains(id) {
                    dangling.push(id.clone());
                }
            }
        }
        dangling
    }

    pub fn to_json_pretty(&self) -> TopologyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One resource declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update_replace_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deletion_policy: Option<String>,
}

impl Resource {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            type_name: resource_type.as_str().to_string(),
            properties: Map::new(),
            depends_on: Vec::new(),
            update_replace_policy: None,
            deletion_policy: None,
        }
    }

    /// Set a property
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add an explicit ordering dependency
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let logical_id = logical_id.into();
        if !self.depends_on.contains(&logical_id) {
            self.depends_on.push(logical_id);
        }
        self
    }

    /// What happens on stack deletion and replacement
    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.update_replace_policy = Some(policy.as_str().to_string());
        self.deletion_policy = Some(policy.as_str().to_string());
        self
    }

    /// Declared type, if it is one this crate knows
    pub fn resource_type(&self) -> Option<ResourceType> {
        ResourceType::from_type_name(&self.type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn deletion_policy(&self) -> Option<&str> {
        self.deletion_policy.as_deref()
    }
}

/// Deploy-time input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    parameter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
}

impl Parameter {
    pub fn new(parameter_type: impl Into<String>) -> Self {
        Self {
            parameter_type: parameter_type.into(),
            default: None,
        }
    }

    /// Image id resolved from a public SSM parameter
    pub fn ssm_image_id(parameter_name: &str) -> Self {
        Self::new("AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>").with_default(parameter_name)
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn parameter_type(&self) -> &str {
        &self.parameter_type
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Stack output, optionally exported for other stacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    export: Option<Export>,
}

impl Output {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            export: None,
        }
    }

    pub fn exported_as(mut self, name: impl Into<String>) -> Self {
        self.export = Some(Export { name: name.into() });
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn export_name(&self) -> Option<&str> {
        self.export.as_ref().map(|e| e.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_duplicate_logical_id_rejected() {
        let mut template = Template::new("Net", "test");
        template
            .add_resource("Vpc", Resource::new(ResourceType::Vpc))
            .unwrap();
        let err = template
            .add_resource("Vpc", Resource::new(ResourceType::Vpc))
            .unwrap_err();

        assert_eq!(
            err,
            TopologyError::DuplicateLogicalId {
                stack: "Net".to_string(),
                logical_id: "Vpc".to_string()
            }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut template = Template::new("Db", "database");
        template
            .add_resource(
                "Instance",
                Resource::new(ResourceType::DbInstance)
                    .property("Engine", "mysql")
                    .removal_policy(RemovalPolicy::Snapshot),
            )
            .unwrap();
        template
            .add_output(
                "Out",
                Output::new(Intrinsic::reference("Instance")).exported_as("Db:Out"),
            )
            .unwrap();

        let value = serde_json::to_value(&template).unwrap();
        assert_eq!(
            value,
            json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Description": "database",
                "Resources": {
                    "Instance": {
                        "Type": "AWS::RDS::DBInstance",
                        "Properties": { "Engine": "mysql" },
                        "UpdateReplacePolicy": "Snapshot",
                        "DeletionPolicy": "Snapshot"
                    }
                },
                "Outputs": {
                    "Out": {
                        "Value": { "Ref": "Instance" },
                        "Export": { "Name": "Db:Out" }
                    }
                }
            })
        );
    }

    #[test]
    fn test_resources_keep_insertion_order() {
        let mut template = Template::new("S", "order");
        for id in ["Zeta", "Alpha", "Mid"] {
            template
                .add_resource(id, Resource::new(ResourceType::Subnet))
                .unwrap();
        }
        let json = template.to_json_pretty().unwrap();
        let zeta = json.find("Zeta").unwrap();
        let alpha = json.find("Alpha").unwrap();
        let mid = json.find("Mid").unwrap();
        assert!(zeta < alpha && alpha < mid);
    }

    #[test]
    fn test_identical_parameter_is_idempotent() {
        let mut template = Template::new("S", "params");
        let param = Parameter::ssm_image_id("/aws/service/x");
        template.add_parameter("Ami", param.clone()).unwrap();
        template.add_parameter("Ami", param).unwrap();
        assert_eq!(template.parameters().len(), 1);
        assert!(template
            .add_parameter("Ami", Parameter::new("String"))
            .is_err());
    }

    #[test]
    fn test_dangling_references() {
        let mut template = Template::new("S", "refs");
        template
            .add_resource(
                "Route",
                Resource::new(ResourceType::Route)
                    .property("RouteTableId", Intrinsic::reference("Missing"))
                    .depends_on("AlsoMissing"),
            )
            .unwrap();
        assert_eq!(
            template.dangling_references(),
            vec!["Missing".to_string(), "AlsoMissing".to_string()]
        );
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut template = Template::new("S", "round trip");
        template
            .add_resource(
                "Sg",
                Resource::new(ResourceType::SecurityGroup).property("GroupDescription", "web"),
            )
            .unwrap();
        let parsed: Template = serde_json::from_str(&template.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed.resources(), template.resources());
        assert_eq!(
            parsed.resources_of_type(ResourceType::SecurityGroup)[0].0,
            "Sg"
        );
    }
}

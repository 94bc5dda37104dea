// Copyright (c) 2025 - Cowboy AI, Inc.
//! Intrinsic functions
//!
//! Values the provisioning engine resolves at deploy time. Rendering an
//! [`Intrinsic`] yields the single-key JSON object the engine expects, e.g.
//! `{"Ref": "MyVpcF9F0CA6F"}`.

use serde_json::{json, Value};

/// Deploy-time function call inside a template
#[derive(Debug, Clone, PartialEq)]
pub enum Intrinsic {
    /// `Ref`: physical id of a resource, or a parameter value
    Ref(String),
    /// `Fn::GetAtt`: attribute of a resource
    GetAtt { logical_id: String, attribute: String },
    /// `Fn::ImportValue`: value exported by another stack
    ImportValue(String),
    /// `Fn::Select`: element of a list
    Select { index: usize, list: Value },
    /// `Fn::GetAZs`: availability zones of a region (empty means current)
    GetAzs(String),
    /// `Fn::Cidr`: `count` blocks of `cidr_bits` host bits carved from `ip_block`
    Cidr {
        ip_block: Value,
        count: usize,
        cidr_bits: u8,
    },
    /// `Fn::Join`
    Join { delimiter: String, parts: Vec<Value> },
    /// `Fn::Base64`
    Base64(Value),
}

impl Intrinsic {
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }

    pub fn import_value(export_name: impl Into<String>) -> Self {
        Self::ImportValue(export_name.into())
    }

    pub fn select(index: usize, list: impl Into<Value>) -> Self {
        Self::Select {
            index,
            list: list.into(),
        }
    }

    /// Zone `index` of the deployment region
    pub fn availability_zone(index: usize) -> Self {
        Self::select(index, Self::GetAzs(String::new()))
    }

    pub fn cidr(ip_block: impl Into<Value>, count: usize, cidr_bits: u8) -> Self {
        Self::Cidr {
            ip_block: ip_block.into(),
            count,
            cidr_bits,
        }
    }

    pub fn join(delimiter: impl Into<String>, parts: Vec<Value>) -> Self {
        Self::Join {
            delimiter: delimiter.into(),
            parts,
        }
    }

    pub fn base64(value: impl Into<Value>) -> Self {
        Self::Base64(value.into())
    }

    /// Render to the engine's JSON form
    pub fn to_value(&self) -> Value {
        match self {
            Self::Ref(id) => json!({ "Ref": id }),
            Self::GetAtt {
                logical_id,
                attribute,
            } => json!({ "Fn::GetAtt": [logical_id, attribute] }),
            Self::ImportValue(name) => json!({ "Fn::ImportValue": name }),
            Self::Select { index, list } => json!({ "Fn::Select": [index, list] }),
            Self::GetAzs(region) => json!({ "Fn::GetAZs": region }),
            Self::Cidr {
                ip_block,
                count,
                cidr_bits,
            } => json!({ "Fn::Cidr": [ip_block, count, cidr_bits] }),
            Self::Join { delimiter, parts } => json!({ "Fn::Join": [delimiter, parts] }),
            Self::Base64(value) => json!({ "Fn::Base64": value }),
        }
    }
}

impl From<Intrinsic> for Value {
    fn from(intrinsic: Intrinsic) -> Self {
        intrinsic.to_value()
    }
}

/// Export names referenced by `Fn::ImportValue` anywhere inside `value`
pub fn imported_names(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_imports(value, &mut names);
    names
}

fn collect_imports(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let (1, Some(Value::String(name))) = (map.len(), map.get("Fn::ImportValue")) {
                names.push(name.clone());
                return;
            }
            map.values().for_each(|v| collect_imports(v, names));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_imports(v, names)),
        _ => {}
    }
}

/// Logical ids referenced by `Ref` or `Fn::GetAtt` anywhere inside `value`
pub fn referenced_ids(value: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    collect_refs(value, &mut ids);
    ids
}

fn collect_refs(value: &Value, ids: &mut Vec<String>) {
    match value {
        Value::Object(map) if map.len() == 1 => {
            if let Some(Value::String(id)) = map.get("Ref") {
                ids.push(id.clone());
            } else if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                if let Some(Value::String(id)) = args.first() {
                    ids.push(id.clone());
                }
            } else {
                map.values().for_each(|v| collect_refs(v, ids));
            }
        }
        Value::Object(map) => map.values().for_each(|v| collect_refs(v, ids)),
        Value::Array(items) => items.iter().for_each(|v| collect_refs(v, ids)),
        _ => {}
    }
}

// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Instance Value Objects
//!
//! Instance types are class + size pairs (`t2.micro`); machine images are
//! either resolved by the engine from a public parameter or pinned by id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{TopologyError, TopologyResult};

/// Instance family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceClass {
    /// `t2`
    Burstable2,
    /// `t3`
    Burstable3,
    /// `t3a`
    Burstable3Amd,
    /// `m5`
    Standard5,
    /// `c5`
    Compute5,
    /// `r5`
    Memory5,
}

impl InstanceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Burstable2 => "t2",
            Self::Burstable3 => "t3",
            Self::Burstable3Amd => "t3a",
            Self::Standard5 => "m5",
            Self::Compute5 => "c5",
            Self::Memory5 => "r5",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "t2" => Some(Self::Burstable2),
            "t3" => Some(Self::Burstable3),
            "t3a" => Some(Self::Burstable3Amd),
            "m5" => Some(Self::Standard5),
            "c5" => Some(Self::Compute5),
            "r5" => Some(Self::Memory5),
            _ => None,
        }
    }
}

/// Instance size within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceSize {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
    Xlarge,
    Xlarge2,
    Xlarge4,
}

impl InstanceSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nano => "nano",
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
            Self::Xlarge2 => "2xlarge",
            Self::Xlarge4 => "4xlarge",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "nano" => Some(Self::Nano),
            "micro" => Some(Self::Micro),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "xlarge" => Some(Self::Xlarge),
            "2xlarge" => Some(Self::Xlarge2),
            "4xlarge" => Some(Self::Xlarge4),
            _ => None,
        }
    }
}

/// Instance type, e.g. `t2.micro`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceType {
    class: InstanceClass,
    size: InstanceSize,
}

impl InstanceType {
    pub fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }

    pub fn class(&self) -> InstanceClass {
        self.class
    }

    pub fn size(&self) -> InstanceSize {
        self.size
    }

    /// Database instance class name for the same hardware (`db.t2.micro`)
    pub fn as_db_class(&self) -> String {
        format!("db.{}", self)
    }
}

impl Default for InstanceType {
    fn default() -> Self {
        Self::of(InstanceClass::Burstable2, InstanceSize::Micro)
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.as_str(), self.size.as_str())
    }
}

impl FromStr for InstanceType {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let s = lowered.strip_prefix("db.").unwrap_or(&lowered);

        let (class, size) = s
            .split_once('.')
            .ok_or_else(|| TopologyError::InvalidInstanceType(s.to_string()))?;

        match (InstanceClass::parse(class), InstanceSize::parse(size)) {
            (Some(class), Some(size)) => Ok(Self::of(class, size)),
            _ => Err(TopologyError::InvalidInstanceType(s.to_string())),
        }
    }
}

impl TryFrom<String> for InstanceType {
    type Error = TopologyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstanceType> for String {
    fn from(value: InstanceType) -> Self {
        value.to_string()
    }
}

/// Amazon Linux generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmazonLinuxGeneration {
    AmazonLinux,
    AmazonLinux2,
}

/// Machine image reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "MachineImageFields")]
pub enum MachineImage {
    /// Latest Amazon Linux, resolved by the engine from a public SSM parameter
    AmazonLinux(AmazonLinuxGeneration),
    /// Fixed image id
    Generic(String),
}

/// Unchecked wire form of [`MachineImage`]
#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum MachineImageFields {
    AmazonLinux(AmazonLinuxGeneration),
    Generic(String),
}

impl TryFrom<MachineImageFields> for MachineImage {
    type Error = TopologyError;

    fn try_from(fields: MachineImageFields) -> Result<Self, Self::Error> {
        match fields {
            MachineImageFields::AmazonLinux(generation) => Ok(Self::AmazonLinux(generation)),
            MachineImageFields::Generic(ami_id) => Self::generic(ami_id),
        }
    }
}

impl MachineImage {
    pub fn amazon_linux() -> Self {
        Self::AmazonLinux(AmazonLinuxGeneration::AmazonLinux)
    }

    /// Pin an image id
    ///
    /// # Invariants
    /// - Id starts with `ami-`
    pub fn generic(ami_id: impl Into<String>) -> TopologyResult<Self> {
        let ami_id = ami_id.into();
        if !ami_id.starts_with("ami-") || ami_id.len() <= 4 {
            return Err(TopologyError::Configuration(format!(
                "Machine image id must look like ami-xxxxxxxx: {}",
                ami_id
            )));
        }
        Ok(Self::Generic(ami_id))
    }

    /// Public parameter holding the latest image id, when the image is resolved at deploy time
    pub fn ssm_parameter(&self) -> Option<&'static str> {
        match self {
            Self::AmazonLinux(AmazonLinuxGeneration::AmazonLinux) => {
                Some("/aws/service/ami-amazon-linux-latest/amzn-ami-hvm-x86_64-gp2")
            }
            Self::AmazonLinux(AmazonLinuxGeneration::AmazonLinux2) => {
                Some("/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2")
            }
            Self::Generic(_) => None,
        }
    }

    /// User data every instance boots with
    pub const USER_DATA_PRELUDE: &'static str = "#!/bin/bash";
}

impl Default for MachineImage {
    fn default() -> Self {
        Self::amazon_linux()
    }
}

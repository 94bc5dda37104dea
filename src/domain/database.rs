// Copyright (c) 2025 - Cowboy AI, Inc.
//! Managed Database Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{TopologyError, TopologyResult};

/// Database engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Mysql,
    Postgres,
}

impl EngineKind {
    /// Engine name as the provider spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    /// Human-readable engine name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Mysql => "MySQL",
            Self::Postgres => "PostgreSQL",
        }
    }

    /// Port the engine listens on by default
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Mysql => 3306,
            Self::Postgres => 5432,
        }
    }

    /// Major versions accepted for this engine
    fn supported_majors(&self) -> &'static [&'static str] {
        match self {
            Self::Mysql => &["5.7", "8.0"],
            Self::Postgres => &["11", "12", "13", "14", "15", "16"],
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Engine plus version, e.g. MySQL 8.0
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DatabaseEngineFields")]
pub struct DatabaseEngine {
    kind: EngineKind,
    version: String,
}

/// Unchecked wire form of [`DatabaseEngine`]
#[derive(Deserialize)]
struct DatabaseEngineFields {
    kind: EngineKind,
    version: String,
}

impl TryFrom<DatabaseEngineFields> for DatabaseEngine {
    type Error = TopologyError;

    fn try_from(fields: DatabaseEngineFields) -> Result<Self, Self::Error> {
        Self::new(fields.kind, fields.version)
    }
}

impl DatabaseEngine {
    /// Create an engine reference
    ///
    /// # Invariants
    /// - Version is a full version whose major line is supported
    ///   (`8.0` and `8.0.35` both belong to MySQL `8.0`)
    pub fn new(kind: EngineKind, version: impl Into<String>) -> TopologyResult<Self> {
        let version = version.into();

        let well_formed = !version.is_empty()
            && version
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if !well_formed {
            return Err(TopologyError::InvalidEngineVersion(format!(
                "{} {}",
                kind, version
            )));
        }

        let supported = kind.supported_majors().iter().any(|major| {
            version == *major || version.starts_with(&format!("{}.", major))
        });
        if !supported {
            return Err(TopologyError::InvalidEngineVersion(format!(
                "{} {} (supported: {})",
                kind,
                version,
                kind.supported_majors().join(", ")
            )));
        }

        Ok(Self { kind, version })
    }

    pub fn mysql(version: impl Into<String>) -> TopologyResult<Self> {
        Self::new(EngineKind::Mysql, version)
    }

    pub fn postgres(version: impl Into<String>) -> TopologyResult<Self> {
        Self::new(EngineKind::Postgres, version)
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn port(&self) -> u16 {
        self.kind.default_port()
    }
}

impl Default for DatabaseEngine {
    fn default() -> Self {
        Self {
            kind: EngineKind::Mysql,
            version: "8.0".to_string(),
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.version)
    }
}

/// What happens to the database when its stack is torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Final snapshot, then delete
    #[default]
    Snapshot,
    Retain,
    Destroy,
}

impl RemovalPolicy {
    /// Value of `DeletionPolicy` / `UpdateReplacePolicy`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "Snapshot",
            Self::Retain => "Retain",
            Self::Destroy => "Delete",
        }
    }
}

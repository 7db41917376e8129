// ABOUTME: Engine, version, plan, tenancy and region catalogue
// ABOUTME: Static plan table plus the engine/version snapshot both wizards select from

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgresql,
    Mysql,
    Mariadb,
    Mongodb,
    Redis,
    Clickhouse,
    Cassandra,
}

impl DatabaseEngine {
    pub const ALL: [DatabaseEngine; 7] = [
        DatabaseEngine::Postgresql,
        DatabaseEngine::Mysql,
        DatabaseEngine::Mariadb,
        DatabaseEngine::Mongodb,
        DatabaseEngine::Redis,
        DatabaseEngine::Clickhouse,
        DatabaseEngine::Cassandra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgresql => "postgresql",
            DatabaseEngine::Mysql => "mysql",
            DatabaseEngine::Mariadb => "mariadb",
            DatabaseEngine::Mongodb => "mongodb",
            DatabaseEngine::Redis => "redis",
            DatabaseEngine::Clickhouse => "clickhouse",
            DatabaseEngine::Cassandra => "cassandra",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgresql => "PostgreSQL",
            DatabaseEngine::Mysql => "MySQL",
            DatabaseEngine::Mariadb => "MariaDB",
            DatabaseEngine::Mongodb => "MongoDB",
            DatabaseEngine::Redis => "Redis",
            DatabaseEngine::Clickhouse => "ClickHouse",
            DatabaseEngine::Cassandra => "Cassandra",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgresql | DatabaseEngine::Mysql | DatabaseEngine::Mariadb => "SQL",
            DatabaseEngine::Mongodb => "NoSQL",
            DatabaseEngine::Redis => "Cache",
            DatabaseEngine::Clickhouse => "Analytics",
            DatabaseEngine::Cassandra => "Distributed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgresql => "Advanced open-source SQL, ACID compliant",
            DatabaseEngine::Mysql => "The world's most popular open-source SQL database",
            DatabaseEngine::Mariadb => "MySQL-compatible with extra features",
            DatabaseEngine::Mongodb => "Document-based, horizontally scalable",
            DatabaseEngine::Redis => "In-memory data structure store, ultra-fast",
            DatabaseEngine::Clickhouse => "Columnar OLAP for real-time analytics",
            DatabaseEngine::Cassandra => "Masterless, multi-region, high write throughput",
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        DatabaseEngine::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| ConsoleError::Validation(format!("unknown database engine '{}'", s)))
    }
}

/// One engine with the versions the service can provision, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineVersions {
    pub engine: DatabaseEngine,
    pub label: String,
    pub versions: Vec<String>,
}

impl EngineVersions {
    pub fn new(engine: DatabaseEngine, versions: &[&str]) -> Self {
        Self {
            engine,
            label: engine.label().to_string(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn default_version(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }
}

/// Read-only snapshot of the engine catalogue taken when a wizard opens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineCatalogue {
    entries: Vec<EngineVersions>,
}

impl EngineCatalogue {
    pub fn new(entries: Vec<EngineVersions>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[EngineVersions] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn versions(&self, engine: DatabaseEngine) -> Option<&EngineVersions> {
        self.entries.iter().find(|e| e.engine == engine)
    }

    /// True when `version` is one of `engine`'s own versions.
    pub fn supports(&self, engine: DatabaseEngine, version: &str) -> bool {
        self.versions(engine)
            .map(|e| e.versions.iter().any(|v| v == version))
            .unwrap_or(false)
    }
}

/// Minimal engine list used when the catalogue cannot be fetched.
pub fn fallback_engines() -> Vec<EngineVersions> {
    vec![
        EngineVersions::new(DatabaseEngine::Postgresql, &["15", "14"]),
        EngineVersions::new(DatabaseEngine::Mysql, &["8.0"]),
        EngineVersions::new(DatabaseEngine::Mariadb, &["10.11"]),
        EngineVersions::new(DatabaseEngine::Mongodb, &["7.0"]),
        EngineVersions::new(DatabaseEngine::Redis, &["7.2"]),
        EngineVersions::new(DatabaseEngine::Clickhouse, &["24.1"]),
        EngineVersions::new(DatabaseEngine::Cassandra, &["4.1"]),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardwarePlan {
    pub id: &'static str,
    pub label: &'static str,
    pub vcpus: u32,
    pub memory_mb: u32,
    pub storage_gb: u32,
    pub hourly_usd: f64,
    pub recommended: bool,
}

impl HardwarePlan {
    /// Memory rendered the way plan cards show it ("8 GB", "512 MB").
    pub fn memory_display(&self) -> String {
        if self.memory_mb >= 1024 {
            format!("{} GB", self.memory_mb / 1024)
        } else {
            format!("{} MB", self.memory_mb)
        }
    }
}

pub static PLANS: [HardwarePlan; 5] = [
    HardwarePlan {
        id: "starter",
        label: "Starter",
        vcpus: 1,
        memory_mb: 1024,
        storage_gb: 20,
        hourly_usd: 0.015,
        recommended: false,
    },
    HardwarePlan {
        id: "basic",
        label: "Basic",
        vcpus: 2,
        memory_mb: 2048,
        storage_gb: 50,
        hourly_usd: 0.030,
        recommended: false,
    },
    HardwarePlan {
        id: "standard",
        label: "Standard",
        vcpus: 4,
        memory_mb: 8192,
        storage_gb: 100,
        hourly_usd: 0.075,
        recommended: true,
    },
    HardwarePlan {
        id: "pro",
        label: "Professional",
        vcpus: 8,
        memory_mb: 16384,
        storage_gb: 250,
        hourly_usd: 0.140,
        recommended: false,
    },
    HardwarePlan {
        id: "enterprise",
        label: "Enterprise",
        vcpus: 16,
        memory_mb: 65536,
        storage_gb: 1000,
        hourly_usd: 0.450,
        recommended: false,
    },
];

pub fn find_plan(id: &str) -> Option<&'static HardwarePlan> {
    PLANS.iter().find(|p| p.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenancyModel {
    #[default]
    Shared,
    Dedicated,
    Cluster,
}

impl TenancyModel {
    pub const ALL: [TenancyModel; 3] = [
        TenancyModel::Shared,
        TenancyModel::Dedicated,
        TenancyModel::Cluster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenancyModel::Shared => "shared",
            TenancyModel::Dedicated => "dedicated",
            TenancyModel::Cluster => "cluster",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TenancyModel::Shared => "Shared",
            TenancyModel::Dedicated => "Dedicated",
            TenancyModel::Cluster => "HA Cluster",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TenancyModel::Shared => "Best value, shared cluster",
            TenancyModel::Dedicated => "Isolated instance, better performance",
            TenancyModel::Cluster => "Multi-node high availability",
        }
    }
}

impl FromStr for TenancyModel {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TenancyModel::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| ConsoleError::Validation(format!("unknown tenancy model '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "af-south-1")]
    AfSouth1,
    #[serde(rename = "eu-west-1")]
    EuWest1,
    #[serde(rename = "ap-south-1")]
    ApSouth1,
    #[serde(rename = "us-east-1")]
    UsEast1,
    #[serde(rename = "us-west-1")]
    UsWest1,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::AfSouth1,
        Region::EuWest1,
        Region::ApSouth1,
        Region::UsEast1,
        Region::UsWest1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::AfSouth1 => "af-south-1",
            Region::EuWest1 => "eu-west-1",
            Region::ApSouth1 => "ap-south-1",
            Region::UsEast1 => "us-east-1",
            Region::UsWest1 => "us-west-1",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::AfSouth1 => "Africa — Johannesburg",
            Region::EuWest1 => "Europe — Frankfurt",
            Region::ApSouth1 => "Asia — Singapore",
            Region::UsEast1 => "US East — New York",
            Region::UsWest1 => "US West — Los Angeles",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| ConsoleError::Validation(format!("unknown region '{}'", s)))
    }
}

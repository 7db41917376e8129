// ABOUTME: Data structures for managed database requests and responses
// ABOUTME: These are serialized to JSON for API communication

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalogue::{DatabaseEngine, HardwarePlan, Region, TenancyModel};
use crate::error::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbStatus {
    Provisioning,
    Running,
    Stopped,
    Restarting,
    Scaling,
    Deleting,
    Error,
    Backup,
}

impl DbStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbStatus::Provisioning => "provisioning",
            DbStatus::Running => "running",
            DbStatus::Stopped => "stopped",
            DbStatus::Restarting => "restarting",
            DbStatus::Scaling => "scaling",
            DbStatus::Deleting => "deleting",
            DbStatus::Error => "error",
            DbStatus::Backup => "backing-up",
        }
    }
}

impl fmt::Display for DbStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagedDatabase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub engine: DatabaseEngine,
    pub version: String,
    pub tenancy_model: TenancyModel,
    pub vcpus: u32,
    pub memory_mb: u32,
    pub storage_gb: u32,
    #[serde(default)]
    pub read_replicas: u32,
    pub region: Region,
    pub status: DbStatus,
    #[serde(default)]
    pub host: String,
    /// Unset until the instance is provisioned.
    pub port: Option<u16>,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub connection_uri: String,
    #[serde(default)]
    pub ssl_enabled: bool,
    #[serde(default)]
    pub publicly_accessible: bool,
    #[serde(default)]
    pub backup_enabled: bool,
    #[serde(default)]
    pub backup_retention_days: u32,
    pub last_backup_at: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub hourly_cost_usd: String,
    pub created_at: Option<String>,
    pub provisioned_at: Option<String>,
    // Detail view only
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub credentials: Vec<DbCredential>,
    #[serde(default)]
    pub backups: Vec<DbBackup>,
    pub latest_metric: Option<DbMetric>,
    // Returned once, on creation
    pub initial_password: Option<String>,
}

/// Decimal fields arrive as strings ("0.0750") from some endpoints and as
/// numbers from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected decimal string or number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbCredential {
    pub id: i64,
    pub username: String,
    pub password: String, // masked in listings
    pub role: String,
    pub is_active: bool,
    pub last_rotated_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbBackup {
    pub backup_id: String,
    pub backup_type: String, // "automated", "manual", "pitr"
    pub status: String,      // "running", "completed", "failed"
    #[serde(default)]
    pub size_gb: f64,
    #[serde(default)]
    pub duration_s: f64,
    pub expires_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbMetric {
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub storage_used_gb: Option<f64>,
    pub active_connections: Option<u64>,
    pub queries_per_second: Option<f64>,
    pub avg_query_latency_ms: Option<f64>,
    pub replication_lag_ms: Option<f64>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionInfo {
    pub region: String,
    pub label: String,
}

/// Provisioning payload. The hardware triple and hourly cost can only be
/// taken from a [`HardwarePlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreationRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub engine: DatabaseEngine,
    pub version: String,
    pub tenancy_model: TenancyModel,
    vcpus: u32,
    memory_mb: u32,
    storage_gb: u32,
    pub read_replicas: u32,
    pub region: Region,
    pub database_name: String,
    pub ssl_enabled: bool,
    pub publicly_accessible: bool,
    pub backup_enabled: bool,
    pub backup_retention_days: u32,
    pub allowed_ips: Vec<String>,
    hourly_cost_usd: f64,
}

impl CreationRequest {
    pub fn new(
        name: String,
        engine: DatabaseEngine,
        version: String,
        tenancy_model: TenancyModel,
        plan: &HardwarePlan,
        region: Region,
        database_name: String,
    ) -> Self {
        Self {
            name,
            description: None,
            engine,
            version,
            tenancy_model,
            vcpus: plan.vcpus,
            memory_mb: plan.memory_mb,
            storage_gb: plan.storage_gb,
            read_replicas: 0,
            region,
            database_name,
            ssl_enabled: true,
            publicly_accessible: false,
            backup_enabled: true,
            backup_retention_days: 7,
            allowed_ips: Vec::new(),
            hourly_cost_usd: plan.hourly_usd,
        }
    }

    pub fn vcpus(&self) -> u32 {
        self.vcpus
    }

    pub fn memory_mb(&self) -> u32 {
        self.memory_mb
    }

    pub fn storage_gb(&self) -> u32 {
        self.storage_gb
    }

    pub fn hourly_cost_usd(&self) -> f64 {
        self.hourly_cost_usd
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScaleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_replicas: Option<u32>,
}

impl ScaleRequest {
    pub fn is_empty(&self) -> bool {
        self.vcpus.is_none()
            && self.memory_mb.is_none()
            && self.storage_gb.is_none()
            && self.read_replicas.is_none()
    }
}

/// Body of a rotate call. Without a username the service rotates its admin user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RotateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    pub message: String,
    pub status: Option<DbStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotatedCredential {
    pub message: String,
    pub username: String,
    pub password: String,
    pub rotated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStrategy {
    #[default]
    FullCopy,
    SchemaOnly,
    DataOnly,
    Incremental,
}

impl MigrationStrategy {
    pub const ALL: [MigrationStrategy; 4] = [
        MigrationStrategy::FullCopy,
        MigrationStrategy::SchemaOnly,
        MigrationStrategy::DataOnly,
        MigrationStrategy::Incremental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStrategy::FullCopy => "full_copy",
            MigrationStrategy::SchemaOnly => "schema_only",
            MigrationStrategy::DataOnly => "data_only",
            MigrationStrategy::Incremental => "incremental",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MigrationStrategy::FullCopy => "Full Copy",
            MigrationStrategy::SchemaOnly => "Schema Only",
            MigrationStrategy::DataOnly => "Data Only",
            MigrationStrategy::Incremental => "Incremental Sync",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            MigrationStrategy::FullCopy => "Most common",
            MigrationStrategy::SchemaOnly => "Fast",
            MigrationStrategy::DataOnly => "Incremental",
            MigrationStrategy::Incremental => "Advanced",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MigrationStrategy::FullCopy => {
                "Copy all schemas and data from source to target. Target is overwritten."
            }
            MigrationStrategy::SchemaOnly => {
                "Copy table/collection structure only. No data rows are transferred."
            }
            MigrationStrategy::DataOnly => {
                "Copy rows/documents into existing schema on target. Schema must already match."
            }
            MigrationStrategy::Incremental => {
                "Sync only changed rows since last migration. Requires binary logging / WAL on source."
            }
        }
    }

    /// Precondition the service cannot check for the user.
    pub fn caution(&self) -> Option<&'static str> {
        match self {
            MigrationStrategy::Incremental => Some(
                "Ensure binary logging (MySQL/MariaDB) or WAL (PostgreSQL) is enabled on the source.",
            ),
            _ => None,
        }
    }
}

impl fmt::Display for MigrationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationStrategy {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        MigrationStrategy::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| ConsoleError::Validation(format!("unknown migration strategy '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationRequest {
    pub target_id: String,
    pub strategy: MigrationStrategy,
    pub tables: Vec<String>, // empty = all
    pub truncate_target: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Completed,
    Simulated,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRef {
    pub id: String,
    pub name: String,
    pub engine: DatabaseEngine,
}

impl From<&ManagedDatabase> for DatabaseRef {
    fn from(db: &ManagedDatabase) -> Self {
        Self {
            id: db.id.clone(),
            name: db.name.clone(),
            engine: db.engine,
        }
    }
}

/// The service echoes the table list, or the literal "(all)" when none was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MigratedTables {
    Listed(Vec<String>),
    All(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub migration_id: String,
    pub status: MigrationStatus,
    pub dry_run: bool,
    pub source: DatabaseRef,
    pub target: DatabaseRef,
    pub strategy: MigrationStrategy,
    pub tables: MigratedTables,
    pub tables_migrated: u64,
    pub rows_migrated: u64,
    pub duration_s: f64,
    #[serde(default)]
    pub truncate_target: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::find_plan;

    #[test]
    fn test_creation_request_takes_hardware_from_plan() {
        let plan = find_plan("basic").unwrap();
        let request = CreationRequest::new(
            "orders-db".into(),
            DatabaseEngine::Mysql,
            "8.0".into(),
            TenancyModel::Dedicated,
            plan,
            Region::UsEast1,
            "atonix".into(),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["vcpus"], 2);
        assert_eq!(json["memory_mb"], 2048);
        assert_eq!(json["storage_gb"], 50);
        assert_eq!(json["hourly_cost_usd"], 0.03);
        assert_eq!(json["tenancy_model"], "dedicated");
        assert_eq!(json["region"], "us-east-1");
        assert_eq!(json["read_replicas"], 0);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_migration_result_accepts_all_tables_marker() {
        let body = r#"{
            "migration_id": "9b1c",
            "status": "simulated",
            "dry_run": true,
            "source": {"id": "a", "name": "orders", "engine": "postgresql"},
            "target": {"id": "b", "name": "orders-copy", "engine": "postgresql"},
            "strategy": "schema_only",
            "tables": "(all)",
            "tables_migrated": 12,
            "rows_migrated": 0,
            "duration_s": 4.2,
            "truncate_target": false,
            "warnings": [],
            "message": "Dry-run complete — no data was written."
        }"#;
        let result: MigrationResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.status, MigrationStatus::Simulated);
        assert_eq!(result.tables, MigratedTables::All("(all)".into()));
        assert_eq!(result.strategy, MigrationStrategy::SchemaOnly);
    }

    #[test]
    fn test_instance_cost_as_string_or_number() {
        let base = r#"{"id":"x","name":"n","engine":"redis","version":"7.2",
            "tenancy_model":"shared","vcpus":1,"memory_mb":1024,"storage_gb":20,
            "region":"af-south-1","status":"running","last_backup_at":null,
            "created_at":null,"provisioned_at":null,"vpc_id":null,
            "latest_metric":null,"initial_password":null,"hourly_cost_usd":COST}"#;
        let as_text: ManagedDatabase =
            serde_json::from_str(&base.replace("COST", "\"0.0150\"")).unwrap();
        assert_eq!(as_text.hourly_cost_usd, "0.0150");
        let as_number: ManagedDatabase =
            serde_json::from_str(&base.replace("COST", "0.015")).unwrap();
        assert_eq!(as_number.hourly_cost_usd, "0.015");
    }

    #[test]
    fn test_instance_with_null_port_parses() {
        let listing = r#"[{"id":"x","name":"n","engine":"mysql","version":"8.0",
            "tenancy_model":"shared","vcpus":1,"memory_mb":1024,"storage_gb":20,
            "region":"af-south-1","status":"provisioning","host":"","port":null,
            "hourly_cost_usd":"0.0150"},
            {"id":"y","name":"m","engine":"mysql","version":"8.0",
            "tenancy_model":"shared","vcpus":1,"memory_mb":1024,"storage_gb":20,
            "region":"af-south-1","status":"running","host":"db.example.com","port":3306,
            "hourly_cost_usd":"0.0150"}]"#;
        let dbs: Vec<ManagedDatabase> = serde_json::from_str(listing).unwrap();
        assert_eq!(dbs[0].port, None);
        assert_eq!(dbs[1].port, Some(3306));
    }

    #[test]
    fn test_rotate_request_omits_missing_username() {
        let body = serde_json::to_value(RotateRequest::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));
        let body = serde_json::to_value(RotateRequest {
            username: Some("app_user"),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "username": "app_user" }));
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "schema-only".parse::<MigrationStrategy>().unwrap(),
            MigrationStrategy::SchemaOnly
        );
        assert!("mirror".parse::<MigrationStrategy>().is_err());
        assert!(MigrationStrategy::Incremental.caution().is_some());
        assert!(MigrationStrategy::FullCopy.caution().is_none());
    }
}

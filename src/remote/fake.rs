// ABOUTME: In-memory gateway used by wizard tests
// ABOUTME: Records submitted requests and answers with canned responses

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::models::{
    CreationRequest, DatabaseRef, ManagedDatabase, MigratedTables, MigrationRequest,
    MigrationResult, MigrationStatus,
};
use super::{DatabaseGateway, InitialSecret};
use crate::catalogue::{DatabaseEngine, EngineVersions};
use crate::error::ConsoleError;

pub fn instance(id: &str, name: &str, engine: DatabaseEngine) -> ManagedDatabase {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "engine": engine,
        "version": "1",
        "tenancy_model": "shared",
        "vcpus": 1,
        "memory_mb": 1024,
        "storage_gb": 20,
        "region": "af-south-1",
        "status": "running",
        "hourly_cost_usd": "0.0150"
    }))
    .expect("valid instance fixture")
}

#[derive(Default)]
pub struct FakeGateway {
    pub databases: Vec<ManagedDatabase>,
    pub engines_fail: bool,
    pub list_fail: bool,
    pub migrate_fail: bool,
    pub created: Mutex<Vec<CreationRequest>>,
    pub migrations: Mutex<Vec<(String, MigrationRequest)>>,
}

impl FakeGateway {
    fn lookup(&self, id: &str) -> DatabaseRef {
        self.databases
            .iter()
            .find(|d| d.id == id)
            .map(DatabaseRef::from)
            .unwrap_or_else(|| DatabaseRef {
                id: id.to_string(),
                name: id.to_string(),
                engine: DatabaseEngine::Postgresql,
            })
    }
}

#[async_trait]
impl DatabaseGateway for FakeGateway {
    async fn list_engines(&self) -> Result<Vec<EngineVersions>> {
        if self.engines_fail {
            anyhow::bail!(ConsoleError::Connection("catalogue offline".into()));
        }
        Ok(vec![EngineVersions::new(
            DatabaseEngine::Postgresql,
            &["15", "14"],
        )])
    }

    async fn list_databases(&self) -> Result<Vec<ManagedDatabase>> {
        if self.list_fail {
            anyhow::bail!(ConsoleError::Connection("list offline".into()));
        }
        Ok(self.databases.clone())
    }

    async fn create_database(
        &self,
        spec: &CreationRequest,
    ) -> Result<(ManagedDatabase, InitialSecret)> {
        self.created.lock().unwrap().push(spec.clone());
        let db = instance("db-new", &spec.name, spec.engine);
        Ok((db, InitialSecret::new("initial-pw".to_string())))
    }

    async fn migrate_database(
        &self,
        source_id: &str,
        spec: &MigrationRequest,
    ) -> Result<MigrationResult> {
        self.migrations
            .lock()
            .unwrap()
            .push((source_id.to_string(), spec.clone()));
        if self.migrate_fail {
            return Err(ConsoleError::Api {
                status: 400,
                message: Some("Target database must be running to accept a migration.".into()),
            }
            .into());
        }

        let target = self.lookup(&spec.target_id);
        let mut warnings = Vec::new();
        if spec.truncate_target {
            warnings.push(format!(
                "Target database {} was truncated before migration.",
                target.name
            ));
        }
        Ok(MigrationResult {
            migration_id: "mig-1".into(),
            status: if spec.dry_run {
                MigrationStatus::Simulated
            } else {
                MigrationStatus::Completed
            },
            dry_run: spec.dry_run,
            source: self.lookup(source_id),
            target,
            strategy: spec.strategy,
            tables: if spec.tables.is_empty() {
                MigratedTables::All("(all)".into())
            } else {
                MigratedTables::Listed(spec.tables.clone())
            },
            tables_migrated: spec.tables.len().max(8) as u64,
            rows_migrated: 1200,
            duration_s: 3.5,
            truncate_target: spec.truncate_target,
            warnings,
            message: "ok".into(),
        })
    }
}

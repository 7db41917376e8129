// ABOUTME: Remote managed database API module
// ABOUTME: Submission gateway trait plus the HTTP client that implements it

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod models;

pub use client::DatabaseClient;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use crate::catalogue::EngineVersions;
use models::{CreationRequest, ManagedDatabase, MigrationRequest, MigrationResult};

/// The calls the two wizards make. Every call is single-shot; nothing here retries.
#[async_trait]
pub trait DatabaseGateway: Send + Sync {
    async fn list_engines(&self) -> Result<Vec<EngineVersions>>;

    async fn list_databases(&self) -> Result<Vec<ManagedDatabase>>;

    async fn create_database(&self, spec: &CreationRequest)
        -> Result<(ManagedDatabase, InitialSecret)>;

    async fn migrate_database(
        &self,
        source_id: &str,
        spec: &MigrationRequest,
    ) -> Result<MigrationResult>;
}

/// Admin password returned by the service exactly once, at creation time.
///
/// Not `Clone`; reading it consumes it.
pub struct InitialSecret(String);

impl InitialSecret {
    pub(crate) fn new(secret: String) -> Self {
        Self(secret)
    }

    pub fn reveal(self) -> String {
        self.0
    }
}

impl fmt::Debug for InitialSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("InitialSecret(********)")
    }
}

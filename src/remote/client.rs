// ABOUTME: HTTP client for the managed database API
// ABOUTME: Handles provisioning, migration and lifecycle calls with error normalization

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::models::{
    ActionResponse, CreationRequest, DbBackup, DbCredential, DbMetric, ManagedDatabase,
    MigrationRequest, MigrationResult, RegionInfo, RotateRequest, RotatedCredential, ScaleRequest,
};
use super::{DatabaseGateway, InitialSecret};
use crate::catalogue::EngineVersions;
use crate::config::ConsoleConfig;
use crate::error::{server_message, ConsoleError};

pub struct DatabaseClient {
    client: Client,
    api_base_url: String,
    api_token: Option<String>,
}

impl DatabaseClient {
    pub fn new(api_base_url: String, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Token {}", token)),
            None => request,
        }
    }

    /// Sends a request and returns the raw successful response. Non-2xx
    /// answers become [`ConsoleError::Api`] carrying the server's message.
    async fn dispatch(&self, request: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ConsoleError::Connection(e.to_string()))
            .with_context(|| {
                format!(
                    "Failed to {}. The database service may be unavailable",
                    what
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = server_message(&body);
            warn!(status = status.as_u16(), ?message, "{} rejected", what);
            return Err(ConsoleError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.dispatch(request, what).await?;
        let parsed = response
            .json()
            .await
            .with_context(|| format!("Failed to parse response to {}", what))?;
        Ok(parsed)
    }

    pub async fn list_regions(&self) -> Result<Vec<RegionInfo>> {
        let request = self.client.get(self.url("databases/regions/"));
        self.fetch(request, "list regions").await
    }

    pub async fn get_database(&self, id: &str) -> Result<ManagedDatabase> {
        let request = self.client.get(self.url(&format!("databases/{}/", id)));
        self.fetch(request, "fetch database details").await
    }

    pub async fn delete_database(&self, id: &str) -> Result<()> {
        info!(database = id, "Deleting database");
        let request = self.client.delete(self.url(&format!("databases/{}/", id)));
        self.dispatch(request, "delete database").await?;
        Ok(())
    }

    pub async fn restart_database(&self, id: &str) -> Result<ActionResponse> {
        info!(database = id, "Restarting database");
        let request = self
            .client
            .post(self.url(&format!("databases/{}/restart/", id)));
        self.fetch(request, "restart database").await
    }

    pub async fn scale_database(&self, id: &str, spec: &ScaleRequest) -> Result<ManagedDatabase> {
        info!(database = id, ?spec, "Scaling database");
        let request = self
            .client
            .post(self.url(&format!("databases/{}/scale/", id)))
            .json(spec);
        self.fetch(request, "scale database").await
    }

    pub async fn list_credentials(&self, id: &str) -> Result<Vec<DbCredential>> {
        let request = self
            .client
            .get(self.url(&format!("databases/{}/credentials/", id)));
        self.fetch(request, "list credentials").await
    }

    pub async fn rotate_credential(
        &self,
        id: &str,
        username: Option<&str>,
    ) -> Result<RotatedCredential> {
        info!(database = id, username, "Rotating credential");
        let request = self
            .client
            .post(self.url(&format!("databases/{}/rotate/", id)))
            .json(&RotateRequest { username });
        self.fetch(request, "rotate credentials").await
    }

    pub async fn list_backups(&self, id: &str) -> Result<Vec<DbBackup>> {
        let request = self
            .client
            .get(self.url(&format!("databases/{}/backups/", id)));
        self.fetch(request, "list backups").await
    }

    pub async fn create_backup(&self, id: &str, backup_type: &str) -> Result<DbBackup> {
        info!(database = id, backup_type, "Starting backup");
        let request = self
            .client
            .post(self.url(&format!("databases/{}/backup/", id)))
            .json(&serde_json::json!({ "backup_type": backup_type }));
        self.fetch(request, "start backup").await
    }

    pub async fn restore_backup(&self, id: &str, backup_id: &str) -> Result<ActionResponse> {
        info!(database = id, backup_id, "Restoring backup");
        let request = self
            .client
            .post(self.url(&format!("databases/{}/restore/", id)))
            .json(&serde_json::json!({ "backup_id": backup_id }));
        self.fetch(request, "restore backup").await
    }

    pub async fn list_metrics(&self, id: &str) -> Result<Vec<DbMetric>> {
        let request = self
            .client
            .get(self.url(&format!("databases/{}/metrics/", id)));
        self.fetch(request, "fetch metrics").await
    }
}

#[async_trait]
impl DatabaseGateway for DatabaseClient {
    async fn list_engines(&self) -> Result<Vec<EngineVersions>> {
        let request = self.client.get(self.url("databases/engines/"));
        self.fetch(request, "load engine catalogue").await
    }

    async fn list_databases(&self) -> Result<Vec<ManagedDatabase>> {
        let request = self.client.get(self.url("databases/"));
        self.fetch(request, "list databases").await
    }

    async fn create_database(
        &self,
        spec: &CreationRequest,
    ) -> Result<(ManagedDatabase, InitialSecret)> {
        info!(
            name = %spec.name,
            engine = %spec.engine,
            version = %spec.version,
            region = %spec.region,
            "Submitting database creation"
        );
        let request = self.client.post(self.url("databases/")).json(spec);
        let mut created: ManagedDatabase = self.fetch(request, "create database").await?;
        let secret = InitialSecret::new(created.initial_password.take().unwrap_or_default());
        debug!(database = %created.id, "Database created");
        Ok((created, secret))
    }

    async fn migrate_database(
        &self,
        source_id: &str,
        spec: &MigrationRequest,
    ) -> Result<MigrationResult> {
        info!(
            source = source_id,
            target_id = %spec.target_id,
            strategy = %spec.strategy,
            dry_run = spec.dry_run,
            truncate_target = spec.truncate_target,
            "Submitting database migration"
        );
        let request = self
            .client
            .post(self.url(&format!("databases/{}/migrate/", source_id)))
            .json(spec);
        self.fetch(request, "migrate database").await
    }
}

// ABOUTME: Console configuration loaded from TOML with environment overrides
// ABOUTME: Carries the API endpoint, credentials and the offline engine catalogue

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalogue::{fallback_engines, EngineVersions, Region};
use crate::error::ConsoleError;

pub const DEFAULT_CONFIG_FILE: &str = "atonix.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/services";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub default_region: Region,
    /// Engines offered when the catalogue endpoint cannot be reached.
    pub fallback_engines: Vec<EngineVersions>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout_secs: 30,
            default_region: Region::default(),
            fallback_engines: fallback_engines(),
        }
    }
}

impl ConsoleConfig {
    /// Loads `path` if given (it must exist), else `./atonix.toml` when
    /// present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            }
        };

        let Some(file) = candidate else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read config file {}", file.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", file.display()))?;
        tracing::debug!(path = %file.display(), "Loaded console configuration");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: ConsoleConfig =
            toml::from_str(content).map_err(|e| ConsoleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConsoleError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConsoleError::Config("api_base_url must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConsoleError::Config("timeout_secs must be positive".into()));
        }
        if self.fallback_engines.is_empty() {
            return Err(ConsoleError::Config(
                "fallback_engines must list at least one engine".into(),
            ));
        }
        if let Some(empty) = self.fallback_engines.iter().find(|e| e.versions.is_empty()) {
            return Err(ConsoleError::Config(format!(
                "fallback engine {} lists no versions",
                empty.engine
            )));
        }
        Ok(())
    }

    /// Applies command-line/environment values on top of the file.
    pub fn with_overrides(mut self, api_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_base_url = url;
        }
        if token.is_some() {
            self.api_token = token;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::DatabaseEngine;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.fallback_engines.len(), 7);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = ConsoleConfig::parse(
            r#"
            api_base_url = "https://cloud.example.com/api/services"
            default_region = "eu-west-1"

            [[fallback_engines]]
            engine = "postgresql"
            label = "PostgreSQL"
            versions = ["16", "15"]
            "#,
        )
        .unwrap();
        assert_eq!(config.default_region, Region::EuWest1);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.fallback_engines.len(), 1);
        assert_eq!(config.fallback_engines[0].engine, DatabaseEngine::Postgresql);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(ConsoleConfig::parse("timeout_secs = 0").is_err());
        assert!(ConsoleConfig::parse("default_region = \"mars-1\"").is_err());
        assert!(ConsoleConfig::parse("fallback_engines = []").is_err());
        assert!(ConsoleConfig::parse(
            "[[fallback_engines]]\nengine = \"redis\"\nlabel = \"Redis\"\nversions = []"
        )
        .is_err());
    }

    #[test]
    fn test_load_from_file_and_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_token = \"from-file\"\ntimeout_secs = 10").unwrap();

        let config = ConsoleConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_token.as_deref(), Some("from-file"));
        assert_eq!(config.timeout_secs, 10);

        let overridden =
            config.with_overrides(Some("http://127.0.0.1:8000".into()), Some("from-env".into()));
        assert_eq!(overridden.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(overridden.api_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(ConsoleConfig::load(Some(Path::new("/nonexistent/atonix.toml"))).is_err());
    }
}

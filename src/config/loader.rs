//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration and seed distribution rules from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::NewDistributionRule;

use super::types::{EngineConfig, RuleSeedFile};

/// Environment variable overriding `store.database_url`.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable overriding `server.bind_address`.
pub const BIND_ADDRESS_ENV: &str = "TIP_ENGINE_BIND";

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── engine.yaml        # Engine, store, server and notification settings
/// └── rules/             # Optional
///     └── default.yaml   # Distribution rules created at startup
/// ```
///
/// # Example
///
/// ```no_run
/// use tip_pool_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config")?;
/// println!("Listening on {}", loader.config().server.bind_address);
/// # Ok::<(), tip_pool_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
    seed_rules: Vec<NewDistributionRule>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// `engine.yaml` is required. The `rules/` directory is optional; every
    /// `.yaml` file in it is read in file-name order.
    ///
    /// # Errors
    ///
    /// * [`EngineError::ConfigNotFound`] if `engine.yaml` is missing
    /// * [`EngineError::ConfigParseError`] if any file is invalid YAML or
    ///   has the wrong shape
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let config = Self::load_yaml::<EngineConfig>(&path.join("engine.yaml"))?;
        let seed_rules = Self::load_rules(&path.join("rules"))?;

        Ok(Self { config, seed_rules })
    }

    /// Builds a loader from already parsed values.
    pub fn from_parts(config: EngineConfig, seed_rules: Vec<NewDistributionRule>) -> Self {
        Self { config, seed_rules }
    }

    /// Applies [`DATABASE_URL_ENV`] and [`BIND_ADDRESS_ENV`] from the process
    /// environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(DATABASE_URL_ENV).ok(),
            std::env::var(BIND_ADDRESS_ENV).ok(),
        )
    }

    /// Replaces the database URL and bind address where a value is given.
    pub fn with_overrides(mut self, database_url: Option<String>, bind: Option<String>) -> Self {
        if let Some(url) = database_url.filter(|url| !url.trim().is_empty()) {
            self.config.store.database_url = Some(url);
        }
        if let Some(bind) = bind.filter(|bind| !bind.trim().is_empty()) {
            self.config.server.bind_address = bind;
        }
        self
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every rule seed file in the rules directory.
    fn load_rules(rules_dir: &Path) -> EngineResult<Vec<NewDistributionRule>> {
        if !rules_dir.exists() {
            return Ok(Vec::new());
        }

        let rules_dir_str = rules_dir.display().to_string();
        let entries = fs::read_dir(rules_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rules_dir_str.clone(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rules_dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml") {
                files.push(path);
            }
        }
        files.sort();

        let mut rules = Vec::new();
        for file in files {
            rules.extend(Self::load_yaml::<RuleSeedFile>(&file)?.rules);
        }
        Ok(rules)
    }

    /// Returns the parsed `engine.yaml`.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the distribution rules to create at startup.
    pub fn seed_rules(&self) -> &[NewDistributionRule] {
        &self.seed_rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;

    fn config_path() -> &'static str {
        "./config"
    }

    #[test]
    fn test_load_bundled_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().store.backend, StoreBackend::Memory);
        assert!(!loader.config().engine.lock_finalized_pools);
        assert!(!loader.seed_rules().is_empty());
    }

    #[test]
    fn test_bundled_rules_parse_as_documents() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        for rule in loader.seed_rules() {
            let document = crate::models::RulesDocument::from_value(&rule.rules);
            assert!(
                document.diagnostics().is_empty(),
                "rule '{}' has diagnostics",
                rule.name
            );
        }
    }

    #[test]
    fn test_missing_directory_returns_not_found() {
        let result = ConfigLoader::load("./config/does-not-exist");
        assert!(matches!(result, Err(EngineError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let loader = ConfigLoader::from_parts(EngineConfig::default(), Vec::new()).with_overrides(
            Some("postgres://db/tips".to_string()),
            Some(String::new()),
        );
        assert_eq!(
            loader.config().store.database_url.as_deref(),
            Some("postgres://db/tips")
        );
        assert_eq!(loader.config().server.bind_address, "0.0.0.0:3000");
    }
}

//! Configuration types for the Tip Pool Engine.
//!
//! These types map onto `engine.yaml` and the rule seed files under
//! `rules/`.

use serde::Deserialize;

use crate::engine::EngineSettings;
use crate::models::NewDistributionRule;

/// Which [`TipStore`](crate::store::TipStore) backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// In-process tables; state is lost on restart.
    #[default]
    Memory,
    /// PostgreSQL through `sqlx`.
    Postgres,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Connection string, required for `postgres`.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Event bus settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NotificationConfig {
    /// Events buffered per subscriber before it starts lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// Contents of `engine.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct EngineConfig {
    /// Calculation behaviour.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Storage backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// HTTP server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Event bus.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// One file under `rules/`: a list of distribution rules to create at
/// startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleSeedFile {
    /// Rules in file order.
    pub rules: Vec<NewDistributionRule>,
}

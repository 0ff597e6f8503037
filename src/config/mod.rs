//! Configuration loading for the Tip Pool Engine.
//!
//! Settings live in `engine.yaml`; distribution rules to create at startup
//! live under `rules/`. Selected values can be overridden from the
//! environment.
//!
//! # Example
//!
//! ```no_run
//! use tip_pool_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config").unwrap().with_env_overrides();
//! println!("Store backend: {:?}", loader.config().store.backend);
//! ```

mod loader;
mod types;

pub use loader::{BIND_ADDRESS_ENV, ConfigLoader, DATABASE_URL_ENV};
pub use types::{
    EngineConfig, NotificationConfig, RuleSeedFile, ServerConfig, StoreBackend, StoreConfig,
};

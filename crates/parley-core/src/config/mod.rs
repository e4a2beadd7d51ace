//! Configuration system — schema, layered resolution, and env overrides.
//!
//! # Usage
//! ```no_run
//! use parley_core::config;
//!
//! let cfg = config::load_config().expect("config");
//! println!("Model: {}", cfg.model);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_dir, load_config, load_config_from_dir, save_config};
pub use schema::{AppConfig, ApprovalMode, ConfigError, ProviderSettings, StoredConfig};

//! Config resolver — merges the on-disk settings file, environment
//! variables, and registry defaults into one validated [`AppConfig`].
//!
//! # Resolution precedence (highest first)
//! 1. Environment variables (credentials and base-URL overrides)
//! 2. Values from the settings file (`config.json`, then `config.toml`)
//! 3. Registry defaults, per provider
//! 4. Hard-coded fallbacks
//!
//! Each stage takes a typed value and returns a new typed value; nothing
//! mutates an untyped map. A structurally malformed file is treated as empty
//! (resolution never fails on parse errors), but an invalid enum value such
//! as a bad `approvalMode` is a fatal [`ConfigError`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::schema::{AppConfig, ApprovalMode, ConfigError, ProviderSettings, StoredConfig};
use crate::registry::{self, PROVIDERS};

/// Directory under the user's home holding all Parley state.
pub const CONFIG_DIR_NAME: &str = ".parley";
/// Primary settings file, tried first.
pub const CONFIG_JSON_NAME: &str = "config.json";
/// Secondary settings file, tried when the JSON file is absent.
pub const CONFIG_TOML_NAME: &str = "config.toml";
/// System-instructions file (bootstrapped by the CLI's `--config` flag).
pub const INSTRUCTIONS_FILE_NAME: &str = "instructions.md";

/// Hard fallbacks, used when neither file nor environment provides a value.
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_INSTRUCTIONS: &str =
    "You are a helpful AI assistant. Please perform the requested file operations.";

/// Default config directory (`~/.parley`).
pub fn get_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to the instructions file under a config directory.
pub fn instructions_path(dir: &Path) -> PathBuf {
    dir.join(INSTRUCTIONS_FILE_NAME)
}

/// The settings file currently in effect, if any (JSON wins over TOML).
pub fn config_file_path(dir: &Path) -> Option<PathBuf> {
    let json = dir.join(CONFIG_JSON_NAME);
    if json.exists() {
        return Some(json);
    }
    let toml = dir.join(CONFIG_TOML_NAME);
    if toml.exists() {
        return Some(toml);
    }
    None
}

/// Load and resolve configuration from the default directory.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_dir(&get_config_dir())
}

/// Load and resolve configuration from a specific directory.
///
/// Creates the directory and bootstraps a default `config.json` when no
/// settings file exists yet.
pub fn load_config_from_dir(dir: &Path) -> Result<AppConfig, ConfigError> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("failed to create config dir {}: {e}", dir.display());
    }
    bootstrap_default_file(dir);

    let stored = match config_file_path(dir) {
        Some(path) => read_stored(&path),
        None => StoredConfig::default(),
    };

    let stored = merge_registry_defaults(stored);
    let stored = apply_env_overrides(stored);
    finalize(stored)
}

/// Write the persisted subset back to disk.
///
/// Writes to whichever settings file already exists, defaulting to JSON.
/// Callers report failures; the in-memory configuration stays valid either
/// way.
pub fn save_config(config: &AppConfig, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = config_file_path(dir).unwrap_or_else(|| dir.join(CONFIG_JSON_NAME));
    let stored = config.to_stored();

    let contents = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        toml::to_string_pretty(&stored).map_err(std::io::Error::other)?
    } else {
        serde_json::to_string_pretty(&stored).map_err(std::io::Error::other)?
    };

    std::fs::write(&path, contents)?;
    debug!("config saved to {}", path.display());
    Ok(())
}

/// Create a default `config.json` when no settings file exists.
///
/// Runs at most once per missing-file condition and never overwrites.
fn bootstrap_default_file(dir: &Path) {
    if config_file_path(dir).is_some() {
        return;
    }

    let mut providers = std::collections::BTreeMap::new();
    for spec in PROVIDERS {
        providers.insert(spec.name.to_string(), ProviderSettings::from(spec));
    }
    let stored = StoredConfig {
        model: Some(DEFAULT_MODEL.to_string()),
        provider: Some(DEFAULT_PROVIDER.to_string()),
        approval_mode: Some(ApprovalMode::default().to_string()),
        instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
        providers,
        default_provider: Some(DEFAULT_PROVIDER.to_string()),
    };

    let path = dir.join(CONFIG_JSON_NAME);
    match serde_json::to_string_pretty(&stored) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                warn!("failed to write default config to {}: {e}", path.display());
            } else {
                info!("created default config file at {}", path.display());
            }
        }
        Err(e) => warn!("failed to serialize default config: {e}"),
    }
}

/// Parse the settings file leniently: any read or parse failure yields an
/// empty stored config so resolution falls back to defaults.
fn read_stored(path: &Path) -> StoredConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("failed to read config file {}: {e}", path.display());
            return StoredConfig::default();
        }
    };

    let parsed = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        toml::from_str::<StoredConfig>(&contents).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<StoredConfig>(&contents).map_err(|e| e.to_string())
    };

    match parsed {
        Ok(stored) => stored,
        Err(e) => {
            warn!("failed to parse config file {}: {e}", path.display());
            StoredConfig::default()
        }
    }
}

/// Inject registry defaults for providers missing from the file, and
/// backfill missing fields on providers the file does mention.
fn merge_registry_defaults(mut stored: StoredConfig) -> StoredConfig {
    for spec in PROVIDERS {
        match stored.providers.get_mut(spec.name) {
            Some(settings) => settings.backfill_from(spec),
            None => {
                stored
                    .providers
                    .insert(spec.name.to_string(), ProviderSettings::from(spec));
            }
        }
    }
    stored
}

/// Apply environment overrides: credentials via each provider's `env_key`,
/// endpoints via `<PROVIDER_ID_UPPERCASE>_BASE_URL`. The self-hosted
/// provider also honors the legacy unscoped `OLLAMA_BASE_URL`.
fn apply_env_overrides(mut stored: StoredConfig) -> StoredConfig {
    for (id, settings) in stored.providers.iter_mut() {
        if let Some(env_key) = settings.env_key.as_deref() {
            if let Ok(key) = std::env::var(env_key) {
                if !key.is_empty() {
                    settings.api_key = Some(key);
                }
            }
        }

        let scoped = registry::base_url_env_var(id);
        if let Ok(url) = std::env::var(&scoped) {
            if !url.is_empty() {
                settings.base_url = Some(url);
                continue;
            }
        }
        if id == "ollama" {
            if let Ok(url) = std::env::var(registry::LEGACY_OLLAMA_BASE_URL_ENV) {
                if !url.is_empty() {
                    settings.base_url = Some(url);
                }
            }
        }
    }
    stored
}

/// Backfill top-level scalars from the hard fallbacks and validate.
fn finalize(stored: StoredConfig) -> Result<AppConfig, ConfigError> {
    let approval_mode = match stored.approval_mode.as_deref() {
        None | Some("") => ApprovalMode::default(),
        Some(raw) => raw.parse()?,
    };

    let non_empty = |value: Option<String>, fallback: &str| -> String {
        match value {
            Some(v) if !v.is_empty() => v,
            _ => fallback.to_string(),
        }
    };

    Ok(AppConfig {
        model: non_empty(stored.model, DEFAULT_MODEL),
        provider: non_empty(stored.provider, DEFAULT_PROVIDER),
        approval_mode,
        instructions: non_empty(stored.instructions, DEFAULT_INSTRUCTIONS),
        providers: stored.providers,
        default_provider: non_empty(stored.default_provider, DEFAULT_PROVIDER),
    })
}

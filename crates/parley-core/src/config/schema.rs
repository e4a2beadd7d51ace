//! Configuration schema — the persisted file shape and the resolved runtime
//! configuration.
//!
//! `StoredConfig` is deliberately lenient (everything optional) so a partial
//! or hand-edited file never fails to parse structurally; `AppConfig` is the
//! fully resolved value the rest of the workspace consumes. On disk the file
//! keeps the historical mixed casing: `approvalMode` is camelCase, everything
//! else snake_case.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::ProviderSpec;

/// How much confirmation the user wants before acting on model output.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalMode {
    #[default]
    Auto,
    Manual,
    None,
}

impl FromStr for ApprovalMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ApprovalMode::Auto),
            "manual" => Ok(ApprovalMode::Manual),
            "none" => Ok(ApprovalMode::None),
            other => Err(ConfigError::InvalidApprovalMode(other.to_string())),
        }
    }
}

impl fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApprovalMode::Auto => "auto",
            ApprovalMode::Manual => "manual",
            ApprovalMode::None => "none",
        };
        f.write_str(s)
    }
}

/// Per-provider settings, both as stored on disk and as resolved at runtime.
///
/// `api_key` is omitted from serialization when absent so a credential never
/// appears in the file as an explicit null.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Display name (e.g. `"OpenAI"`).
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl From<&ProviderSpec> for ProviderSettings {
    fn from(spec: &ProviderSpec) -> Self {
        ProviderSettings {
            name: spec.display_name.to_string(),
            base_url: spec.default_base_url.map(String::from),
            env_key: spec.env_key.map(String::from),
            api_key: None,
        }
    }
}

impl ProviderSettings {
    /// Backfill fields that are unset here from a registry spec.
    /// File values always win field-by-field.
    pub fn backfill_from(&mut self, spec: &ProviderSpec) {
        if self.name.is_empty() {
            self.name = spec.display_name.to_string();
        }
        if self.base_url.is_none() {
            self.base_url = spec.default_base_url.map(String::from);
        }
        if self.env_key.is_none() {
            self.env_key = spec.env_key.map(String::from);
        }
    }
}

/// The persisted subset of the configuration, as read from / written to disk.
///
/// Every field is optional: absence means "use the next layer down".
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(rename = "approvalMode", skip_serializing_if = "Option::is_none")]
    pub approval_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    // Last so the TOML rendering puts the provider tables after the scalars.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
}

/// The resolved, validated runtime configuration.
///
/// The active provider's credential is *not* duplicated at the top level;
/// [`AppConfig::api_key`] looks it up through the provider map on demand, so
/// there is nothing to keep in sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Active model identifier.
    pub model: String,
    /// Active provider identifier (key into `providers`).
    pub provider: String,
    pub approval_mode: ApprovalMode,
    /// System instructions prepended to every request.
    pub instructions: String,
    pub providers: BTreeMap<String, ProviderSettings>,
    pub default_provider: String,
}

impl AppConfig {
    /// Settings for the active provider, if configured.
    pub fn active_provider(&self) -> Option<&ProviderSettings> {
        self.providers.get(&self.provider)
    }

    /// The credential in effect for the active provider.
    pub fn api_key(&self) -> Option<&str> {
        self.active_provider().and_then(|p| p.api_key.as_deref())
    }

    /// The resolved base URL for the active provider.
    pub fn base_url(&self) -> Option<&str> {
        self.active_provider().and_then(|p| p.base_url.as_deref())
    }

    /// Set a provider's credential at runtime. Creates the entry if the
    /// provider is not yet known. Persist with `save_config` if desired.
    pub fn set_api_key(&mut self, provider: &str, api_key: impl Into<String>) {
        self.providers
            .entry(provider.to_string())
            .or_insert_with(|| ProviderSettings {
                name: provider.to_string(),
                ..Default::default()
            })
            .api_key = Some(api_key.into());
    }

    /// The persisted subset of this configuration.
    pub fn to_stored(&self) -> StoredConfig {
        StoredConfig {
            model: Some(self.model.clone()),
            provider: Some(self.provider.clone()),
            approval_mode: Some(self.approval_mode.to_string()),
            instructions: Some(self.instructions.clone()),
            providers: self.providers.clone(),
            default_provider: Some(self.default_provider.clone()),
        }
    }
}

/// Fatal configuration errors.
///
/// These surface before any network request is attempted; they are never
/// swallowed into a transcript.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid approval mode '{0}' (expected auto, manual, or none)")]
    InvalidApprovalMode(String),

    #[error("no provider is configured")]
    MissingProvider,

    #[error("no configuration found for provider '{0}'")]
    UnknownProvider(String),

    #[error("API key for provider '{0}' is missing")]
    MissingApiKey(String),

    #[error("base URL for provider '{0}' is required but not configured")]
    MissingBaseUrl(String),
}

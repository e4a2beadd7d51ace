//! Client construction from a resolved configuration.
//!
//! All validation that can fail before a network request happens here:
//! unknown provider, missing endpoint, missing credential.

use std::time::Duration;

use tracing::debug;

use parley_core::config::{AppConfig, ConfigError};
use parley_core::registry::{find_by_name, Dialect};

use crate::client::{HttpChatClient, DEFAULT_BASE_URL};

/// Request timeout for all provider clients.
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Build a chat client for the configuration's active provider.
///
/// Providers absent from the registry but present in the provider map are
/// treated as generic OpenAI-compatible endpoints and still require a
/// credential; only the self-hosted registry family goes without one.
pub fn create_client(config: &AppConfig) -> Result<HttpChatClient, ConfigError> {
    if config.provider.is_empty() {
        return Err(ConfigError::MissingProvider);
    }
    let settings = config
        .active_provider()
        .ok_or_else(|| ConfigError::UnknownProvider(config.provider.clone()))?;

    let spec = find_by_name(&config.provider);
    let (dialect, credential_optional) = match spec {
        Some(spec) => (spec.dialect, spec.credential_optional),
        None => (Dialect::Generic, false),
    };

    // Credential first, so a provider missing everything reports the key.
    let api_key = settings.api_key.clone();
    if api_key.is_none() && !credential_optional {
        return Err(ConfigError::MissingApiKey(config.provider.clone()));
    }

    // Only the Azure dialect routes per deployment and has no usable
    // default endpoint; generic providers fall back to the client's.
    let base_url = match settings.base_url.as_deref() {
        Some(url) => url,
        None if dialect == Dialect::Azure => {
            return Err(ConfigError::MissingBaseUrl(config.provider.clone()))
        }
        None => DEFAULT_BASE_URL,
    };

    debug!(
        provider = %config.provider,
        base_url,
        dialect = ?dialect,
        "creating chat client"
    );

    Ok(HttpChatClient::new(
        base_url,
        api_key,
        dialect,
        settings.name.clone(),
        Duration::from_millis(REQUEST_TIMEOUT_MS),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatClient;
    use parley_core::config::{AppConfig, ApprovalMode, ProviderSettings};
    use std::collections::BTreeMap;

    fn config_with(provider: &str, settings: ProviderSettings) -> AppConfig {
        let mut providers = BTreeMap::new();
        providers.insert(provider.to_string(), settings);
        AppConfig {
            model: "gpt-4".into(),
            provider: provider.into(),
            approval_mode: ApprovalMode::Auto,
            instructions: "You are a helpful assistant.".into(),
            providers,
            default_provider: provider.into(),
        }
    }

    #[test]
    fn test_known_provider_with_credential() {
        let config = config_with(
            "openai",
            ProviderSettings {
                name: "OpenAI".into(),
                base_url: Some("https://api.openai.com/v1".into()),
                env_key: Some("OPENAI_API_KEY".into()),
                api_key: Some("sk-test".into()),
            },
        );
        let client = create_client(&config).unwrap();
        assert_eq!(client.display_name(), "OpenAI");
    }

    #[test]
    fn test_missing_credential_rejected_for_known_provider() {
        let config = config_with(
            "openai",
            ProviderSettings {
                name: "OpenAI".into(),
                base_url: Some("https://api.openai.com/v1".into()),
                env_key: Some("OPENAI_API_KEY".into()),
                api_key: None,
            },
        );
        let err = create_client(&config).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey("openai".into()));
        assert_eq!(err.to_string(), "API key for provider 'openai' is missing");
    }

    #[test]
    fn test_self_hosted_provider_needs_no_credential() {
        let config = config_with(
            "ollama",
            ProviderSettings {
                name: "Ollama".into(),
                base_url: Some("http://localhost:11434".into()),
                env_key: None,
                api_key: None,
            },
        );
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_azure_without_endpoint_rejected() {
        let config = config_with(
            "azure",
            ProviderSettings {
                name: "Azure OpenAI".into(),
                base_url: None,
                env_key: Some("AZURE_OPENAI_API_KEY".into()),
                api_key: Some("azure-key".into()),
            },
        );
        let err = create_client(&config).unwrap_err();
        assert_eq!(err, ConfigError::MissingBaseUrl("azure".into()));
    }

    #[test]
    fn test_azure_without_anything_reports_missing_key_first() {
        let config = config_with(
            "azure",
            ProviderSettings {
                name: "Azure OpenAI".into(),
                base_url: None,
                env_key: Some("AZURE_OPENAI_API_KEY".into()),
                api_key: None,
            },
        );
        let err = create_client(&config).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey("azure".into()));
    }

    #[test]
    fn test_generic_provider_without_endpoint_gets_default() {
        // `google` has no registry default endpoint; with a credential it
        // must still produce a client.
        let config = config_with(
            "google",
            ProviderSettings {
                name: "Google".into(),
                base_url: None,
                env_key: Some("GOOGLE_API_KEY".into()),
                api_key: Some("g-key".into()),
            },
        );
        let client = create_client(&config).unwrap();
        assert_eq!(client.display_name(), "Google");
    }

    #[test]
    fn test_unknown_configured_provider_gets_generic_client() {
        let config = config_with(
            "my-proxy",
            ProviderSettings {
                name: "My Proxy".into(),
                base_url: Some("https://llm.internal/v1".into()),
                env_key: None,
                api_key: Some("sk-internal".into()),
            },
        );
        let client = create_client(&config).unwrap();
        assert_eq!(client.display_name(), "My Proxy");
    }

    #[test]
    fn test_unknown_provider_still_requires_credential() {
        let config = config_with(
            "my-proxy",
            ProviderSettings {
                name: "My Proxy".into(),
                base_url: Some("https://llm.internal/v1".into()),
                env_key: None,
                api_key: None,
            },
        );
        let err = create_client(&config).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey("my-proxy".into()));
    }

    #[test]
    fn test_unconfigured_provider_rejected() {
        let mut config = config_with(
            "openai",
            ProviderSettings {
                name: "OpenAI".into(),
                base_url: Some("https://api.openai.com/v1".into()),
                env_key: None,
                api_key: Some("sk".into()),
            },
        );
        config.provider = "nowhere".into();
        let err = create_client(&config).unwrap_err();
        assert_eq!(err, ConfigError::UnknownProvider("nowhere".into()));
    }

    #[test]
    fn test_empty_provider_rejected() {
        let mut config = config_with(
            "openai",
            ProviderSettings {
                name: "OpenAI".into(),
                base_url: Some("https://api.openai.com/v1".into()),
                env_key: None,
                api_key: Some("sk".into()),
            },
        );
        config.provider = String::new();
        let err = create_client(&config).unwrap_err();
        assert_eq!(err, ConfigError::MissingProvider);
    }
}

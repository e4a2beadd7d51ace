//! Provider registry — static specs for the supported chat providers.
//!
//! Each `ProviderSpec` describes how to reach one provider family: default
//! endpoint, which environment variable holds its credential, and which
//! protocol dialect its client speaks. The registry seeds the configuration
//! resolver's defaults and drives client construction; it is never mutated
//! after startup.

/// Protocol dialect a provider's client must speak.
///
/// Most providers expose an OpenAI-compatible `/chat/completions` endpoint;
/// Azure routes through per-deployment paths with a versioned query string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// Standard `{base}/chat/completions` with Bearer auth.
    Generic,
    /// Azure OpenAI: `{base}/openai/deployments/{model}/...` + `api-key` header.
    Azure,
}

/// Static specification describing one chat provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal identifier (e.g. `"openai"`). Unique within the registry.
    pub name: &'static str,
    /// Human-readable name for logs and config bootstrap.
    pub display_name: &'static str,
    /// Default API base URL, if the provider has a well-known one.
    pub default_base_url: Option<&'static str>,
    /// Environment variable holding the credential (e.g. `"OPENAI_API_KEY"`).
    pub env_key: Option<&'static str>,
    /// Protocol dialect for client construction.
    pub dialect: Dialect,
    /// Whether the provider can be used without a credential (self-hosted).
    pub credential_optional: bool,
}

/// All supported providers. Order matters only for config bootstrap output.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        default_base_url: Some("https://api.openai.com/v1"),
        env_key: Some("OPENAI_API_KEY"),
        dialect: Dialect::Generic,
        credential_optional: false,
    },
    ProviderSpec {
        name: "azure",
        display_name: "Azure OpenAI",
        // No default: the endpoint is per-deployment and must be configured.
        default_base_url: None,
        env_key: Some("AZURE_OPENAI_API_KEY"),
        dialect: Dialect::Azure,
        credential_optional: false,
    },
    ProviderSpec {
        name: "ollama",
        display_name: "Ollama",
        default_base_url: Some("http://localhost:11434"),
        env_key: None,
        dialect: Dialect::Generic,
        credential_optional: true,
    },
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic",
        default_base_url: Some("https://api.anthropic.com/v1"),
        env_key: Some("ANTHROPIC_API_KEY"),
        dialect: Dialect::Generic,
        credential_optional: false,
    },
    ProviderSpec {
        name: "google",
        display_name: "Google",
        default_base_url: None,
        env_key: Some("GOOGLE_API_KEY"),
        dialect: Dialect::Generic,
        credential_optional: false,
    },
    ProviderSpec {
        name: "mistral",
        display_name: "Mistral AI",
        default_base_url: Some("https://api.mistral.ai/v1"),
        env_key: Some("MISTRAL_API_KEY"),
        dialect: Dialect::Generic,
        credential_optional: false,
    },
];

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// Environment variable for a provider's base-URL override
/// (`<PROVIDER_ID_UPPERCASE>_BASE_URL`).
pub fn base_url_env_var(provider: &str) -> String {
    format!("{}_BASE_URL", provider.to_uppercase())
}

/// Legacy unscoped endpoint override, honored only for the self-hosted
/// provider when the scoped variable is absent.
pub const LEGACY_OLLAMA_BASE_URL_ENV: &str = "OLLAMA_BASE_URL";

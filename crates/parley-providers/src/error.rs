//! Provider error taxonomy.
//!
//! The `Display` strings here are user-facing: the agent loop streams them
//! into the transcript verbatim when a request fails, so the wording is part
//! of the interface and is covered by tests.

/// Errors from a chat backend, classified by HTTP status and transport kind.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// HTTP 429.
    #[error("Rate Limit Exceeded: {0}")]
    RateLimited(String),

    /// HTTP 401.
    #[error("Authentication Error: {0}")]
    AuthenticationFailed(String),

    /// HTTP 404. Usually a bad model name or deleted deployment.
    #[error("Model not found or resource does not exist: {0}")]
    ResourceNotFound(String),

    /// The request never got an HTTP response (DNS, refused, timeout).
    #[error("Connection Error: {0}")]
    ConnectionFailed(String),

    /// Any other non-success HTTP status.
    #[error("API Error (Status {code}): {message}")]
    ProviderStatus { code: u16, message: String },

    /// The provider answered but the payload was unusable.
    #[error("API Error: {0}")]
    Api(String),

    /// Catch-all for failures outside the categories above.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl ChatError {
    /// Classify a non-success HTTP status.
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            429 => ChatError::RateLimited(message),
            401 => ChatError::AuthenticationFailed(message),
            404 => ChatError::ResourceNotFound(message),
            _ => ChatError::ProviderStatus { code, message },
        }
    }

    /// Classify a reqwest transport failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            ChatError::ConnectionFailed(err.to_string())
        } else {
            ChatError::Unexpected(err.to_string())
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Providers wrap errors as `{"error": {"message": "..."}}`; anything else
/// is returned as-is (trimmed).
pub fn message_from_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ChatError::from_status(429, "slow down".into()),
            ChatError::RateLimited(_)
        ));
        assert!(matches!(
            ChatError::from_status(401, "bad key".into()),
            ChatError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ChatError::from_status(404, "no such model".into()),
            ChatError::ResourceNotFound(_)
        ));
        assert!(matches!(
            ChatError::from_status(500, "boom".into()),
            ChatError::ProviderStatus { code: 500, .. }
        ));
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(
            ChatError::RateLimited("try later".into()).to_string(),
            "Rate Limit Exceeded: try later"
        );
        assert_eq!(
            ChatError::AuthenticationFailed("invalid api key".into()).to_string(),
            "Authentication Error: invalid api key"
        );
        assert_eq!(
            ChatError::ResourceNotFound("gpt-9".into()).to_string(),
            "Model not found or resource does not exist: gpt-9"
        );
        assert_eq!(
            ChatError::ConnectionFailed("refused".into()).to_string(),
            "Connection Error: refused"
        );
        assert_eq!(
            ChatError::ProviderStatus {
                code: 503,
                message: "overloaded".into()
            }
            .to_string(),
            "API Error (Status 503): overloaded"
        );
        assert_eq!(
            ChatError::Unexpected("what".into()).to_string(),
            "An unexpected error occurred: what"
        );
    }

    #[test]
    fn test_message_from_wrapped_body() {
        let body = r#"{"error": {"message": "Invalid API key provided"}}"#;
        assert_eq!(message_from_body(body), "Invalid API key provided");
    }

    #[test]
    fn test_message_from_raw_body() {
        assert_eq!(message_from_body("  plain text error\n"), "plain text error");
        assert_eq!(message_from_body(r#"{"detail": "nope"}"#), r#"{"detail": "nope"}"#);
    }
}

//! Streaming HTTP chat client for OpenAI-compatible and Azure endpoints.

use std::collections::VecDeque;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, error};

use parley_core::registry::Dialect;
use parley_core::types::Message;

use crate::error::{message_from_body, ChatError};
use crate::sse::SseParser;
use crate::traits::{ChatClient, TokenStream};

/// API version pinned for Azure deployment routes.
pub const AZURE_API_VERSION: &str = "2023-07-01-preview";

/// Endpoint used when a generic provider has no resolved base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// A streaming chat client for any provider speaking a known [`Dialect`].
pub struct HttpChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    dialect: Dialect,
    display_name: String,
}

impl std::fmt::Debug for HttpChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatClient")
            .field("base_url", &self.base_url)
            .field("dialect", &self.dialect)
            .field("provider", &self.display_name)
            .finish()
    }
}

impl HttpChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        dialect: Dialect,
        display_name: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        HttpChatClient {
            http,
            base_url: base_url.into(),
            api_key,
            dialect,
            display_name: display_name.into(),
        }
    }

    /// Build the full chat completions URL for a model.
    fn completions_url(&self, model: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.dialect {
            Dialect::Generic => format!("{base}/chat/completions"),
            Dialect::Azure => format!(
                "{base}/openai/deployments/{model}/chat/completions?api-version={AZURE_API_VERSION}"
            ),
        }
    }
}

#[async_trait::async_trait]
impl ChatClient for HttpChatClient {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<TokenStream, ChatError> {
        let url = self.completions_url(model);
        debug!(
            provider = %self.display_name,
            model,
            messages = messages.len(),
            "starting streamed completion"
        );

        let body = ChatRequest {
            model,
            messages,
            stream: true,
        };

        let mut request = self.http.post(&url).json(&body);
        match self.dialect {
            // Azure authenticates with a bare api-key header, not Bearer.
            Dialect::Azure => {
                if let Some(key) = &self.api_key {
                    request = request.header("api-key", key);
                }
            }
            Dialect::Generic => {
                if let Some(key) = &self.api_key {
                    request = request.bearer_auth(key);
                }
            }
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = %self.display_name, error = %e, "HTTP request failed");
            ChatError::from_transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = message_from_body(&body);
            error!(
                provider = %self.display_name,
                status = %status,
                message = %message,
                "API error"
            );
            return Err(ChatError::from_status(status.as_u16(), message));
        }

        let state = (
            response.bytes_stream().boxed(),
            SseParser::default(),
            VecDeque::new(),
        );
        let stream = futures::stream::unfold(state, |(mut bytes, mut parser, mut pending)| async move {
            loop {
                if let Some(fragment) = pending.pop_front() {
                    return Some((Ok(fragment), (bytes, parser, pending)));
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => pending.extend(parser.feed(&chunk)),
                    Some(Err(e)) => {
                        return Some((
                            Err(ChatError::from_transport(e)),
                            (bytes, parser, pending),
                        ))
                    }
                    None => return None,
                }
            }
        });

        Ok(stream.boxed())
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

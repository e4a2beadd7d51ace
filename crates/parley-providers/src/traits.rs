//! Chat client trait — the seam between the agent loop and the network.

use async_trait::async_trait;
use futures::stream::BoxStream;

use parley_core::types::Message;

use crate::error::ChatError;

/// Stream of assistant text fragments, ending when the provider closes the
/// response. An `Err` item terminates the turn.
pub type TokenStream = BoxStream<'static, Result<String, ChatError>>;

/// Trait that all chat backends implement.
///
/// The main implementation is [`crate::client::HttpChatClient`]; tests
/// substitute in-memory fakes.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a streaming chat completion request.
    ///
    /// Returns an error when the request itself fails (connection, auth,
    /// rate limit); mid-stream failures surface as `Err` items on the
    /// returned stream instead.
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<TokenStream, ChatError>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

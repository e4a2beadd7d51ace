//! Streaming provider layer for Parley.
//!
//! # Architecture
//!
//! - [`traits::ChatClient`] — trait that all chat backends implement
//! - [`client::HttpChatClient`] — streaming client for OpenAI-compatible and
//!   Azure-style `/chat/completions` endpoints
//! - [`factory::create_client`] — builds the right client from a resolved
//!   [`parley_core::config::AppConfig`]
//! - [`sse`] — incremental server-sent-events parsing

pub mod client;
pub mod error;
pub mod factory;
pub mod sse;
pub mod traits;

// Re-export main types for convenience
pub use client::HttpChatClient;
pub use error::ChatError;
pub use factory::create_client;
pub use traits::{ChatClient, TokenStream};

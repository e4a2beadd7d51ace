//! Conversational agent loop for Parley.
//!
//! One [`agent_loop::AgentLoop`] owns a transcript and a chat client; each
//! call to [`agent_loop::AgentLoop::run`] is one conversational turn yielding
//! a stream of assistant text fragments.

pub mod agent_loop;

pub use agent_loop::AgentLoop;

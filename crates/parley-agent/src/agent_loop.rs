//! Agent loop — one transcript, one chat client, streamed turns.
//!
//! Each call to [`AgentLoop::run`] appends the user's prompt to the
//! transcript, sends the whole conversation to the provider, and returns a
//! stream of assistant text fragments. When the stream ends the transcript
//! already holds the full assistant reply, so callers can start the next
//! turn immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use parley_core::types::Message;
use parley_providers::traits::ChatClient;

/// System message used when no instructions are configured.
pub const FALLBACK_INSTRUCTIONS: &str = "You are a helpful assistant.";

type ItemSink = Arc<dyn Fn(&str) + Send + Sync>;
type LoadingSink = Arc<dyn Fn(bool) + Send + Sync>;

/// The conversational agent: owns the transcript and drives streamed turns.
///
/// Cancellation is sticky: after [`AgentLoop::cancel`], in-flight and future
/// turns are suppressed until [`AgentLoop::resume`].
pub struct AgentLoop {
    client: Arc<dyn ChatClient>,
    model: String,
    instructions: String,
    transcript: Arc<Mutex<Vec<Message>>>,
    cancelled: Arc<AtomicBool>,
    in_flight: Arc<AtomicBool>,
    on_item: Option<ItemSink>,
    on_loading: Option<LoadingSink>,
}

impl AgentLoop {
    pub fn new(
        client: Arc<dyn ChatClient>,
        model: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        AgentLoop {
            client,
            model: model.into(),
            instructions: instructions.into(),
            transcript: Arc::new(Mutex::new(Vec::new())),
            cancelled: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicBool::new(false)),
            on_item: None,
            on_loading: None,
        }
    }

    /// Install a callback invoked with every emitted fragment, including
    /// error text. Fires before the fragment is offered on the stream.
    pub fn with_item_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_item = Some(Arc::new(sink));
        self
    }

    /// Install a callback invoked with `true` when a request starts and
    /// `false` when the turn finishes, on every path including errors.
    pub fn with_loading_sink(mut self, sink: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_loading = Some(Arc::new(sink));
        self
    }

    /// Run one conversational turn.
    ///
    /// Returns a stream of assistant text fragments. If the agent is
    /// cancelled the turn is a no-op and the stream is empty; the prompt is
    /// not recorded.
    pub fn run(&self, prompt: impl Into<String>) -> ReceiverStream<String> {
        // Bounded at one entry so that after a cancellation at most the
        // already-buffered fragment reaches the consumer.
        let (tx, rx) = mpsc::channel(1);

        if self.cancelled.load(Ordering::SeqCst) {
            debug!("turn skipped: agent is cancelled");
            return ReceiverStream::new(rx);
        }

        // Loading starts before the turn touches any state.
        self.in_flight.store(true, Ordering::SeqCst);
        if let Some(sink) = &self.on_loading {
            sink(true);
        }

        let outbound = {
            let mut transcript = lock(&self.transcript);
            transcript.push(Message::user(prompt));

            let system = if self.instructions.is_empty() {
                FALLBACK_INSTRUCTIONS
            } else {
                self.instructions.as_str()
            };
            let mut messages = Vec::with_capacity(transcript.len() + 1);
            messages.push(Message::system(system));
            messages.extend(transcript.iter().cloned());
            messages
        };

        let client = Arc::clone(&self.client);
        let model = self.model.clone();
        let transcript = Arc::clone(&self.transcript);
        let cancelled = Arc::clone(&self.cancelled);
        let in_flight = Arc::clone(&self.in_flight);
        let on_item = self.on_item.clone();
        let on_loading = self.on_loading.clone();

        tokio::spawn(async move {
            let mut accumulated = String::new();

            match client.stream_chat(&model, &outbound).await {
                Ok(mut stream) => {
                    while let Some(item) = stream.next().await {
                        if cancelled.load(Ordering::SeqCst) {
                            debug!("turn cancelled mid-stream");
                            break;
                        }
                        match item {
                            Ok(fragment) => {
                                if !emit(&tx, &cancelled, &on_item, &fragment).await {
                                    break;
                                }
                                accumulated.push_str(&fragment);
                            }
                            Err(e) => {
                                let text = e.to_string();
                                warn!(provider = client.display_name(), error = %text, "stream failed mid-turn");
                                accumulated.push_str(&text);
                                emit(&tx, &cancelled, &on_item, &text).await;
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    let text = e.to_string();
                    warn!(provider = client.display_name(), error = %text, "chat request failed");
                    accumulated.push_str(&text);
                    emit(&tx, &cancelled, &on_item, &text).await;
                }
            }

            if let Some(sink) = &on_loading {
                sink(false);
            }
            // Record the reply (or its partial/error text) before the
            // sender drops, so stream end implies the transcript is final.
            if !accumulated.is_empty() {
                lock(&transcript).push(Message::assistant(accumulated));
            }
            in_flight.store(false, Ordering::SeqCst);
        });

        ReceiverStream::new(rx)
    }

    /// Stop the current turn and suppress future ones until [`resume`].
    ///
    /// [`resume`]: AgentLoop::resume
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Lift a previous cancellation.
    pub fn resume(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True while a request/stream is being driven.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Forget the conversation so far. Safe to call repeatedly.
    pub fn clear_history(&self) {
        lock(&self.transcript).clear();
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<Message> {
        lock(&self.transcript).clone()
    }
}

/// Fan a fragment out to the item sink and the turn's stream.
///
/// Capacity is reserved before the cancellation check so that once a
/// cancellation is observed no fragment is in flight; combined with the
/// bounded(1) channel, at most one fragment reaches the consumer after
/// `cancel`. Returns `false` when the turn should stop (receiver gone or
/// cancelled).
async fn emit(
    tx: &mpsc::Sender<String>,
    cancelled: &AtomicBool,
    on_item: &Option<ItemSink>,
    fragment: &str,
) -> bool {
    let Ok(permit) = tx.reserve().await else {
        return false;
    };
    if cancelled.load(Ordering::SeqCst) {
        return false;
    }
    if let Some(sink) = on_item {
        sink(fragment);
    }
    permit.send(fragment.to_string());
    true
}

fn lock(transcript: &Mutex<Vec<Message>>) -> MutexGuard<'_, Vec<Message>> {
    transcript.lock().unwrap_or_else(|e| e.into_inner())
}

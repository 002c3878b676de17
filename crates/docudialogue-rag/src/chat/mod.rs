//! Conversation orchestration over streaming LLM backends

pub mod backend;
mod gemini;
mod openai;
mod sse;

pub use backend::{backend_for, ChatBackend, TokenStream};
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::retrieval::{ContextBlock, Retriever};
use crate::types::Turn;

/// Lifecycle of a session's current generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No generation in progress
    Idle,
    /// A user turn was accepted, waiting for the backend's first token
    AwaitingResponse,
    /// Tokens are flowing to the caller
    Streaming,
    /// The last generation failed; the failed user turn stays recorded
    Error,
}

/// A single conversation with append-only history.
///
/// One generation may be in flight at a time; a second [`send`] while a
/// stream is live is rejected with [`Error::SessionBusy`] rather than
/// interleaving appends. Dropping the returned stream mid-flight discards
/// the partial answer and returns the session to [`SessionState::Idle`]
/// without appending an assistant turn.
///
/// [`send`]: ChatSession::send
pub struct ChatSession {
    id: Uuid,
    retriever: Arc<Retriever>,
    history: Arc<Mutex<Vec<Turn>>>,
    state: Arc<Mutex<SessionState>>,
    in_flight: Arc<AtomicBool>,
}

impl ChatSession {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self {
            id: Uuid::new_v4(),
            retriever,
            history: Arc::new(Mutex::new(Vec::new())),
            state: Arc::new(Mutex::new(SessionState::Idle)),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Session identifier, for logging.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Snapshot of the conversation so far.
    pub fn history(&self) -> Vec<Turn> {
        self.history.lock().clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Reset the conversation. Fails while a generation is streaming.
    pub fn clear(&self) -> Result<()> {
        if self.in_flight.load(Ordering::SeqCst) {
            return Err(Error::SessionBusy);
        }
        self.history.lock().clear();
        *self.state.lock() = SessionState::Idle;
        tracing::debug!(session = %self.id, "conversation cleared");
        Ok(())
    }

    /// Submit a user turn and stream the grounded answer.
    ///
    /// The user turn is appended immediately. Context is retrieved for the
    /// query (degrading to the empty marker if retrieval fails), the system
    /// prompt is assembled, and the full history is handed to the configured
    /// backend. The assistant turn is appended only once the stream finishes
    /// successfully; on failure the typed error is surfaced, the session
    /// moves to [`SessionState::Error`], and only the user turn remains.
    ///
    /// Each call produces a fresh, finite, non-restartable stream.
    pub async fn send(&self, user_text: &str, config: &BackendConfig) -> Result<TokenStream> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(Error::SessionBusy);
        }

        match self.start_stream(user_text, config).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                *self.state.lock() = SessionState::Error;
                self.in_flight.store(false, Ordering::SeqCst);
                tracing::warn!(session = %self.id, error = %e, "send failed");
                Err(e)
            }
        }
    }

    async fn start_stream(&self, user_text: &str, config: &BackendConfig) -> Result<TokenStream> {
        *self.state.lock() = SessionState::AwaitingResponse;
        self.history.lock().push(Turn::user(user_text));

        // Retrieval failures degrade to an ungrounded-but-signaled answer
        let context = match self.retriever.retrieve(user_text).await {
            Ok(retrieved) => retrieved.context,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "retrieval failed, continuing without context");
                ContextBlock::Empty
            }
        };
        let system_prompt = PromptBuilder::build_system_prompt(&context);

        let backend = backend_for(config)?;
        let turns = self.history.lock().clone();
        let upstream = backend
            .stream_chat(&system_prompt, &turns, &config.sampling)
            .await?;

        *self.state.lock() = SessionState::Streaming;

        let history = Arc::clone(&self.history);
        let mut guard = TurnGuard {
            state: Arc::clone(&self.state),
            in_flight: Arc::clone(&self.in_flight),
            settled: false,
        };
        let stream = try_stream! {
            let mut upstream = upstream;
            let mut answer = String::new();
            while let Some(fragment) = upstream.next().await {
                let text = match fragment {
                    Ok(text) => text,
                    Err(e) => {
                        guard.settle(SessionState::Error);
                        Err(e)?
                    }
                };
                answer.push_str(&text);
                yield text;
            }
            history.lock().push(Turn::assistant(answer));
            guard.settle(SessionState::Idle);
        };
        Ok(Box::pin(stream))
    }
}

/// Returns the session to a quiescent state exactly once.
///
/// If the stream is dropped before completion the guard's `Drop` runs with
/// `settled == false`: the partial answer is discarded, no assistant turn is
/// appended, and the session becomes idle again.
struct TurnGuard {
    state: Arc<Mutex<SessionState>>,
    in_flight: Arc<AtomicBool>,
    settled: bool,
}

impl TurnGuard {
    fn settle(&mut self, state: SessionState) {
        *self.state.lock() = state;
        self.in_flight.store(false, Ordering::SeqCst);
        self.settled = true;
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        if !self.settled {
            *self.state.lock() = SessionState::Idle;
            self.in_flight.store(false, Ordering::SeqCst);
        }
    }
}

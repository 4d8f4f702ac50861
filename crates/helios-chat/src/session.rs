//! Per-turn orchestration and chat sessions.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use helios_core::{CompletionModel, ConversationHistory, HeliosError, Result, SearchBackend};
use helios_query::Retriever;

use crate::history::format_history;
use crate::prompt::PromptTemplate;

/// Runs one question-answer turn: retrieve, flatten, assemble, complete.
///
/// Holds only shared, read-only handles, so one orchestrator can serve any
/// number of sessions.
pub struct Orchestrator<S, M> {
    /// Fused retrieval over the configured indices.
    retriever: Retriever<S>,

    /// Language model.
    model: Arc<M>,

    /// Fixed instruction block.
    template: PromptTemplate,
}

impl<S, M> Orchestrator<S, M>
where
    S: SearchBackend,
    M: CompletionModel,
{
    /// Create a new orchestrator.
    pub fn new(retriever: Retriever<S>, model: Arc<M>, template: PromptTemplate) -> Self {
        Self {
            retriever,
            model,
            template,
        }
    }

    pub fn retriever(&self) -> &Retriever<S> {
        &self.retriever
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Process one user utterance against `history`.
    ///
    /// Returns the extended history and the answer. `history` itself is never
    /// modified, so a failed turn leaves the caller's transcript untouched.
    pub async fn process_turn(
        &self,
        history: &ConversationHistory,
        utterance: &str,
    ) -> Result<(ConversationHistory, String)> {
        let start = Instant::now();
        if utterance.trim().is_empty() {
            return Err(HeliosError::invalid_argument("question must not be empty"));
        }
        let question = utterance;

        let mut next = history.clone();
        next.push_user(question);

        info!("Processing turn {} ({:?})", next.len() / 2, question);

        let history_text = format_history(&next);

        // Retrieval sees only the bare question; prior turns go to the model.
        let context = self.retriever.context_for(question).await?;

        let prompt = self
            .template
            .render(&context, question, history_text.as_deref());

        debug!(
            "Assembled prompt: {} bytes ({} context, history: {})",
            prompt.len(),
            context.len(),
            history_text.is_some()
        );

        let completion = self.model.complete(&prompt).await?;
        next.push_assistant(completion.clone());

        info!(
            "Turn completed in {}ms with {}",
            start.elapsed().as_millis(),
            self.model.model_id()
        );

        Ok((next, completion))
    }
}

/// A single conversation with the assistant.
///
/// Owns the transcript and processes one turn at a time.
pub struct ChatSession<S, M> {
    orchestrator: Arc<Orchestrator<S, M>>,
    history: ConversationHistory,
}

impl<S, M> ChatSession<S, M>
where
    S: SearchBackend,
    M: CompletionModel,
{
    /// Start a session opened by `greeting`.
    pub fn new(orchestrator: Arc<Orchestrator<S, M>>, greeting: impl Into<String>) -> Self {
        Self {
            orchestrator,
            history: ConversationHistory::new(greeting),
        }
    }

    /// Send a user message and return the assistant's answer.
    ///
    /// The transcript only changes when the whole turn succeeds.
    pub async fn send(&mut self, utterance: &str) -> Result<String> {
        match self.orchestrator.process_turn(&self.history, utterance).await {
            Ok((history, answer)) => {
                self.history = history;
                Ok(answer)
            }
            Err(err) => {
                warn!("Turn failed [{}]: {}", err.error_code(), err);
                Err(err)
            }
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}

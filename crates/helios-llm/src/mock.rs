//! Scripted completion model.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use helios_core::{CompletionModel, HeliosError, Result};

/// Completion model that replays scripted answers.
///
/// Each call pops the next scripted outcome; once the script is exhausted the
/// fallback answer is returned. Every prompt received is recorded.
pub struct MockCompletionModel {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletionModel {
    /// Model that always answers with `answer`.
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: answer.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue an answer for the next unscripted call.
    pub fn then_answer(self, answer: impl Into<String>) -> Self {
        self.push(Ok(answer.into()));
        self
    }

    /// Queue a failure for the next unscripted call.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    fn push(&self, outcome: std::result::Result<String, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

impl Default for MockCompletionModel {
    fn default() -> Self {
        Self::new("mock answer")
    }
}

#[async_trait]
impl CompletionModel for MockCompletionModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match next {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(HeliosError::completion(message)),
            None => Ok(self.fallback.clone()),
        }
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}

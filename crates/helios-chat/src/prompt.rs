//! Prompt assembly.

use std::path::Path;

use tracing::debug;

use helios_core::{HeliosError, Prompt, Result};

/// The fixed instruction block placed at the top of every prompt.
///
/// Loaded from an external asset so wording changes need no code change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    instructions: String,
}

impl PromptTemplate {
    /// Use `instructions` verbatim.
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    /// Read the instruction block from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let instructions = std::fs::read_to_string(path).map_err(|e| {
            HeliosError::config(format!(
                "failed to read instructions from {}: {}",
                path.display(),
                e
            ))
        })?;

        if instructions.trim().is_empty() {
            return Err(HeliosError::config(format!(
                "instructions file {} is empty",
                path.display()
            )));
        }

        debug!(
            "Loaded {} bytes of instructions from {}",
            instructions.len(),
            path.display()
        );

        Ok(Self::new(instructions))
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Assemble a prompt using this template's instructions.
    pub fn render(&self, context: &str, question: &str, history: Option<&str>) -> String {
        assemble(context, &self.instructions, question, history)
    }
}

/// Assemble the final prompt text.
///
/// Layout: instructions, then the `Context:` section, then the prior-turn
/// summary when present, then the question.
pub fn assemble(
    context: &str,
    instructions: &str,
    question: &str,
    history: Option<&str>,
) -> String {
    Prompt {
        instructions: instructions.to_string(),
        context: context.to_string(),
        question: question.to_string(),
        history_summary: history.map(String::from),
    }
    .to_string()
}

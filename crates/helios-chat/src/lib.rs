//! helios-chat - Conversation orchestration
//!
//! This crate ties retrieval and the language model together into a chat:
//!
//! - [`PromptTemplate`] / [`assemble`]: build the final prompt from the fixed
//!   instructions, the flattened context, prior turns and the question.
//! - [`format_history`]: summarise earlier exchanges for the prompt.
//! - [`Orchestrator`]: run one turn end to end without mutating history.
//! - [`ChatSession`]: own a transcript and commit only successful turns.
//! - [`connect`]: wire the Elasticsearch and Bedrock clients from config.

mod assistant;
mod history;
mod prompt;
mod session;

pub use assistant::{connect, connect_retriever, HeliosAssistant};
pub use history::format_history;
pub use prompt::{assemble, PromptTemplate};
pub use session::{ChatSession, Orchestrator};

// Re-export types for convenience
pub use helios_core::{ConversationHistory, ConversationTurn, Role};

//! helios-llm - Language model clients
//!
//! This crate provides the [`CompletionModel`] implementations used by Helios.
//!
//! # Features
//!
//! - Bedrock runtime `InvokeModel` with Anthropic message bodies
//! - Bearer-token authentication, region-derived endpoint
//! - A scripted mock model for tests

mod bedrock;
mod mock;

pub use bedrock::BedrockClient;
pub use mock::MockCompletionModel;

// Re-export the CompletionModel trait for convenience
pub use helios_core::CompletionModel;

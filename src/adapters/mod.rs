//! Generation backends.
//!
//! A [`Generator`] turns a [`Prompt`] into text. The core never constructs
//! one itself; callers pass the backend in, so tests and offline runs can
//! swap in [`ScriptedGenerator`].

pub mod command;
pub mod openai;
pub mod scripted;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::prompts::Prompt;

pub use command::CommandGenerator;
pub use openai::OpenAiGenerator;
pub use scripted::ScriptedGenerator;

/// Output from one generation call
#[derive(Debug, Clone)]
pub struct GeneratorOutput {
    /// The text returned by the backend
    pub content: String,

    /// Tokens used (if reported)
    pub tokens_used: Option<u64>,
}

impl GeneratorOutput {
    /// Create an output with just content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tokens_used: None,
        }
    }
}

/// Text-in, text-out generation capability
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Run one prompt, giving up after `timeout`
    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<GeneratorOutput>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<()>;
}

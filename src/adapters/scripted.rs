//! In-memory backend that replays queued responses.
//!
//! Backs `align --response` replays of saved model output and serves as
//! the generation double in tests. Clones share state, so a test can hand
//! one clone to the orchestrator and inspect the other.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::{Generator, GeneratorOutput};
use crate::prompts::{Prompt, PromptKind};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    queues: HashMap<PromptKind, VecDeque<Reply>>,
    received: Vec<Prompt>,
}

/// Generator with per-kind response queues
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next prompt of `kind`
    pub fn push(&self, kind: PromptKind, content: impl Into<String>) -> &Self {
        self.enqueue(kind, Reply::Text(content.into()));
        self
    }

    /// Queue a failed call for the next prompt of `kind`
    pub fn push_failure(&self, kind: PromptKind, message: impl Into<String>) -> &Self {
        self.enqueue(kind, Reply::Failure(message.into()));
        self
    }

    /// Wait this long before answering each prompt
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every prompt received so far, in order
    pub fn received(&self) -> Vec<Prompt> {
        self.lock().received.clone()
    }

    /// Responses still queued for `kind`
    pub fn remaining(&self, kind: PromptKind) -> usize {
        self.lock().queues.get(&kind).map_or(0, VecDeque::len)
    }

    fn enqueue(&self, kind: PromptKind, reply: Reply) {
        self.lock().queues.entry(kind).or_default().push_back(reply);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        // A panicking test thread must not hide the script from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<GeneratorOutput> {
        let reply = {
            let mut state = self.lock();
            state.received.push(prompt.clone());
            state.queues.get_mut(&prompt.kind).and_then(VecDeque::pop_front)
        };

        if let Some(delay) = self.delay {
            if delay > timeout {
                tokio::time::sleep(timeout).await;
                anyhow::bail!("Scripted '{}' response timed out after {:?}", prompt.kind, timeout);
            }
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Text(content)) => Ok(GeneratorOutput::new(content)),
            Some(Reply::Failure(message)) => anyhow::bail!(message),
            None => anyhow::bail!("No scripted response queued for '{}'", prompt.kind),
        }
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(kind: PromptKind) -> Prompt {
        Prompt {
            kind,
            system: String::new(),
            user: "u".to_string(),
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_per_kind() {
        let generator = ScriptedGenerator::new();
        generator
            .push(PromptKind::DraftClause, "first")
            .push(PromptKind::DraftClause, "second")
            .push(PromptKind::InsertionPoint, "PRECEDING_SNIPPET: x");

        let timeout = Duration::from_secs(1);
        let a = generator.generate(&prompt(PromptKind::DraftClause), timeout).await.unwrap();
        let b = generator.generate(&prompt(PromptKind::InsertionPoint), timeout).await.unwrap();
        let c = generator.generate(&prompt(PromptKind::DraftClause), timeout).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "PRECEDING_SNIPPET: x");
        assert_eq!(c.content, "second");
        assert_eq!(generator.received().len(), 3);
        assert_eq!(generator.remaining(PromptKind::DraftClause), 0);
    }

    #[tokio::test]
    async fn test_failures_and_empty_queue() {
        let generator = ScriptedGenerator::new();
        generator.push_failure(PromptKind::AlignAnchors, "rate limited");

        let timeout = Duration::from_secs(1);
        let err = generator.generate(&prompt(PromptKind::AlignAnchors), timeout).await.unwrap_err();
        assert_eq!(err.to_string(), "rate limited");

        let err = generator.generate(&prompt(PromptKind::AlignAnchors), timeout).await.unwrap_err();
        assert!(err.to_string().contains("align_anchors"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let generator = ScriptedGenerator::new();
        let handle = generator.clone();
        generator.push(PromptKind::DraftClause, "clause");

        handle
            .generate(&prompt(PromptKind::DraftClause), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(generator.received()[0].kind, PromptKind::DraftClause);
    }
}

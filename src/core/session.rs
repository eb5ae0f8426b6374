//! One operation's view of the generator: limits checked before every
//! call, a timeout around it, and the response validated after.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use super::safety::{SafetyLimits, SafetyTracker, SafetyViolation};
use crate::adapters::Generator;
use crate::prompts::Prompt;

/// Generation calls made on behalf of a single operation
pub struct GenerationSession<'a> {
    generator: &'a dyn Generator,
    limits: &'a SafetyLimits,
    tracker: SafetyTracker,
}

impl<'a> GenerationSession<'a> {
    pub fn new(generator: &'a dyn Generator, limits: &'a SafetyLimits) -> Self {
        Self {
            generator,
            limits,
            tracker: SafetyTracker::new(),
        }
    }

    pub fn tracker(&self) -> &SafetyTracker {
        &self.tracker
    }

    /// Run one prompt and return the response text
    pub async fn call(&mut self, prompt: &Prompt) -> Result<String> {
        self.limits.check(&self.tracker)?;

        let step_timeout = self.limits.step_timeout();
        let call_start = Instant::now();

        let output = match tokio::time::timeout(
            step_timeout,
            self.generator.generate(prompt, step_timeout),
        )
        .await
        {
            Ok(result) => result.with_context(|| {
                format!("Generation call '{}' via {} failed", prompt.kind, self.generator.name())
            })?,
            Err(_) => {
                return Err(SafetyViolation::StepTimeout {
                    limit_seconds: self.limits.step_timeout_seconds,
                }
                .into())
            }
        };

        let prompt_bytes = (prompt.system.len() + prompt.user.len()) as u64;
        self.tracker
            .record_call(prompt_bytes, output.content.len() as u64);
        self.limits.validate_response(&output.content)?;

        debug!(
            kind = %prompt.kind,
            duration_ms = call_start.elapsed().as_millis() as u64,
            response_bytes = output.content.len(),
            tokens = ?output.tokens_used,
            "Generation call completed"
        );

        Ok(output.content)
    }
}

/// True for violations that end the whole operation rather than one topic
pub fn is_fatal(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<SafetyViolation>(),
        Some(SafetyViolation::MaxGenerationCalls { .. } | SafetyViolation::OperationTimeout { .. })
    )
}

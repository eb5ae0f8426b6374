//! Safety limits and enforcement for align and augment operations.
//!
//! Prevents runaway operations through configurable limits on:
//! - Number of generation calls
//! - Document and response sizes
//! - Generation call and whole-operation timeouts
//! - Denylist patterns (to avoid sending secrets to a model)

use std::path::Path;
use std::time::Duration;

use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Safety limits for one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Maximum generation calls per operation (default: 100)
    #[serde(default = "default_max_generation_calls")]
    pub max_generation_calls: u32,

    /// Maximum size of each input document in bytes (default: 2MB)
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,

    /// Maximum size of a model response in bytes (default: 1MB)
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,

    /// Per-generation-call timeout in seconds (default: 300 = 5 min)
    #[serde(default = "default_step_timeout")]
    pub step_timeout_seconds: u64,

    /// Whole-operation timeout in seconds (default: 1800 = 30 min)
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,

    /// Glob patterns to reject (documents matching these won't be read)
    #[serde(default = "default_denylist")]
    pub denylist_patterns: Vec<String>,
}

fn default_max_generation_calls() -> u32 {
    100
}
fn default_max_document_bytes() -> u64 {
    2 * 1024 * 1024
} // 2MB
fn default_max_response_bytes() -> u64 {
    1024 * 1024
} // 1MB
fn default_step_timeout() -> u64 {
    300
} // 5 min
fn default_operation_timeout() -> u64 {
    1800
} // 30 min

fn default_denylist() -> Vec<String> {
    vec![
        "**/.env*".to_string(),
        "**/secrets*".to_string(),
        "**/*credential*".to_string(),
        "**/*.pem".to_string(),
        "**/*.key".to_string(),
    ]
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_generation_calls: default_max_generation_calls(),
            max_document_bytes: default_max_document_bytes(),
            max_response_bytes: default_max_response_bytes(),
            step_timeout_seconds: default_step_timeout(),
            operation_timeout_seconds: default_operation_timeout(),
            denylist_patterns: default_denylist(),
        }
    }
}

impl SafetyLimits {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_seconds)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }

    /// Check if a document path matches any denylist pattern
    pub fn is_denylisted(&self, path: &str) -> bool {
        self.denylist_patterns
            .iter()
            .filter_map(|pattern| Pattern::new(pattern).ok())
            .any(|pattern| pattern.matches(path))
    }

    /// Validate a document path before reading it
    pub fn validate_path(&self, path: &Path) -> Result<(), SafetyViolation> {
        let path_str = path.to_string_lossy();
        if self.is_denylisted(&path_str) {
            return Err(SafetyViolation::DenylistMatch {
                path: path_str.to_string(),
            });
        }
        Ok(())
    }

    /// Validate a document against the size limit and, when it came from
    /// a file, the denylist
    pub fn validate_document(
        &self,
        document: &str,
        source_path: Option<&Path>,
    ) -> Result<(), SafetyViolation> {
        let size = document.len() as u64;
        if size > self.max_document_bytes {
            return Err(SafetyViolation::MaxDocumentBytes {
                actual: size,
                limit: self.max_document_bytes,
            });
        }

        if let Some(path) = source_path {
            self.validate_path(path)?;
        }

        Ok(())
    }

    /// Validate a model response against the size limit
    pub fn validate_response(&self, response: &str) -> Result<(), SafetyViolation> {
        let size = response.len() as u64;
        if size > self.max_response_bytes {
            return Err(SafetyViolation::MaxResponseBytes {
                actual: size,
                limit: self.max_response_bytes,
            });
        }
        Ok(())
    }

    /// Check whether another generation call is allowed.
    ///
    /// Only the call budget is checked here; the operation deadline is
    /// enforced around the whole operation by the orchestrator.
    pub fn check(&self, tracker: &SafetyTracker) -> Result<(), SafetyViolation> {
        if tracker.generation_calls >= self.max_generation_calls {
            return Err(SafetyViolation::MaxGenerationCalls {
                actual: tracker.generation_calls,
                limit: self.max_generation_calls,
            });
        }

        Ok(())
    }
}

/// Tracks resource usage during one operation
#[derive(Debug, Clone)]
pub struct SafetyTracker {
    /// Generation calls made so far
    pub generation_calls: u32,

    /// Total prompt bytes sent
    pub prompt_bytes: u64,

    /// Total response bytes received
    pub response_bytes: u64,
}

impl Default for SafetyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyTracker {
    pub fn new() -> Self {
        Self {
            generation_calls: 0,
            prompt_bytes: 0,
            response_bytes: 0,
        }
    }

    /// Record one generation call
    pub fn record_call(&mut self, prompt_bytes: u64, response_bytes: u64) {
        self.generation_calls += 1;
        self.prompt_bytes += prompt_bytes;
        self.response_bytes += response_bytes;
    }
}

/// Safety violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafetyViolation {
    #[error("Maximum generation calls exceeded: {actual} >= {limit}")]
    MaxGenerationCalls { actual: u32, limit: u32 },

    #[error("Maximum document bytes exceeded: {actual} > {limit}")]
    MaxDocumentBytes { actual: u64, limit: u64 },

    #[error("Maximum response bytes exceeded: {actual} > {limit}")]
    MaxResponseBytes { actual: u64, limit: u64 },

    #[error("Generation call timeout after {limit_seconds}s")]
    StepTimeout { limit_seconds: u64 },

    #[error("Operation timeout: {elapsed_seconds}s >= {limit_seconds}s")]
    OperationTimeout {
        elapsed_seconds: u64,
        limit_seconds: u64,
    },

    #[error("Path matches denylist pattern: {path}")]
    DenylistMatch { path: String },
}

//! Core orchestration logic.
//!
//! This module contains:
//! - Orchestrator: align / augment operations
//! - Session: per-operation generation calls under limits
//! - Safety: limits and enforcement

pub mod orchestrator;
pub mod safety;
pub mod session;

pub use orchestrator::Orchestrator;
pub use safety::{SafetyLimits, SafetyTracker, SafetyViolation};
pub use session::GenerationSession;

//! clausealign - topic alignment and augmentation of legal documents
//!
//! Aligns the clauses of two legal documents by topic using a language
//! model, recovers each clause verbatim from the source text, and drafts
//! clauses for topics the weaker document lacks.
//!
//! # Architecture
//!
//! The model is treated as imprecise:
//! - It describes clauses by quoting them or by their first and last words
//! - Every description is located back in the source text, tier by tier
//! - Failures are carried as values per topic, never dropped
//!
//! # Modules
//!
//! - `anchor`: TextLocator tiers, Span, SpanReconstructor
//! - `alignment`: Response parsing, resolution, verification
//! - `augment`: Missing topics, insertion planning, sequential augmentation
//! - `adapters`: Generation backends (OpenAI-compatible, command, scripted)
//! - `core`: Orchestrator, generation sessions, safety limits
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Align two NDAs by topic
//! clausealign align nda_a.txt nda_b.txt
//!
//! # Add the clauses B is missing
//! clausealign augment nda_a.txt nda_b.txt --output nda_b_augmented.txt
//!
//! # Find an anchor offline
//! clausealign locate nda_a.txt "The Recipient"
//! ```

pub mod adapters;
pub mod alignment;
pub mod anchor;
pub mod augment;
pub mod cli;
pub mod config;
pub mod core;
pub mod prompts;

// Re-export main types at crate root for convenience
pub use adapters::{Generator, ScriptedGenerator};
pub use alignment::{AlignmentMode, AlignmentRecord, AlignmentReport};
pub use anchor::{reconstruct, ClauseSpan, Span, SpanError, TextLocator};
pub use augment::{find_missing, plan_insertion, AugmentReport, InsertionPlan, MissingTopicItem};
pub use crate::core::Orchestrator;

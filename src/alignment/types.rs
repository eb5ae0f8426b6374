//! Alignment data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::anchor::{Anchor, ClauseSpan, SpanError};

/// Topic name carried by the parse-failure sentinel record
pub const PARSE_FAILURE_TOPIC: &str = "Parsing Failed";

/// Response shape requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentMode {
    /// `Topic: doc A: <text>, doc B: <text>;` records with full clause text
    FullText,
    /// `Topic / DocA_Start / DocA_End / DocB_Start / DocB_End` blocks
    #[default]
    Anchors,
}

impl AlignmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentMode::FullText => "full_text",
            AlignmentMode::Anchors => "anchors",
        }
    }
}

impl std::fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the model described one side of a topic, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClauseRef {
    /// Full clause text copied by the model
    Quote { text: String },
    /// Start and end boundary phrases
    Anchors { start: Anchor, end: Anchor },
    /// No counterpart in this document
    NotApplicable,
}

/// One topic as parsed from the model response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub topic: String,
    pub doc_a: ClauseRef,
    pub doc_b: ClauseRef,
}

/// Outcome of parsing one model response; never an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    Records(Vec<ParsedRecord>),
    /// Nothing in the response matched a known record shape
    Unparseable { raw: String },
}

/// One matched legal topic across the two documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub topic: String,
    pub doc_a: ClauseSpan,
    pub doc_b: ClauseSpan,
}

impl AlignmentRecord {
    pub fn new(topic: impl Into<String>, doc_a: ClauseSpan, doc_b: ClauseSpan) -> Self {
        Self {
            topic: topic.into(),
            doc_a,
            doc_b,
        }
    }

    /// The single record emitted when a response could not be parsed at all
    pub fn parse_failure(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            topic: PARSE_FAILURE_TOPIC.to_string(),
            doc_a: ClauseSpan::error(SpanError::ParseFailure { raw: raw.clone() }),
            doc_b: ClauseSpan::error(SpanError::ParseFailure { raw }),
        }
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(
            &self.doc_a,
            ClauseSpan::Error {
                error: SpanError::ParseFailure { .. }
            }
        )
    }
}

/// True when `records` is the parse-failure sentinel rather than a
/// (possibly empty) list of aligned topics
pub fn is_parse_failure(records: &[AlignmentRecord]) -> bool {
    records.iter().any(AlignmentRecord::is_parse_failure)
}

/// Result of one align operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Unique identifier for this operation
    pub operation_id: Uuid,
    pub mode: AlignmentMode,
    pub records: Vec<AlignmentRecord>,
    /// Model output the records were parsed from
    pub raw_response: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl AlignmentReport {
    pub fn is_parse_failure(&self) -> bool {
        is_parse_failure(&self.records)
    }
}

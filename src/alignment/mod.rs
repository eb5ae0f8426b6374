//! Clause alignment between two documents.
//!
//! The model response is parsed into [`ParsedRecord`]s, then each side is
//! resolved against its document into a [`ClauseSpan`](crate::anchor::ClauseSpan).

pub mod parser;
pub mod resolve;
pub mod types;

pub use parser::{clean_value, parse_anchors, parse_full_text, parse_response};
pub use resolve::{
    resolve_clause, resolve_record, resolve_records, verify_quote, verify_records,
    VerificationSummary,
};
pub use types::{
    is_parse_failure, AlignmentMode, AlignmentRecord, AlignmentReport, ClauseRef, ParsedRecord,
    ParsedResponse, PARSE_FAILURE_TOPIC,
};

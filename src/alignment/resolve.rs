//! Resolution of parsed records against the source documents, and
//! verification of the resulting spans.

use serde::Serialize;
use tracing::{debug, warn};

use super::types::{AlignmentRecord, ClauseRef, ParsedRecord, ParsedResponse};
use crate::anchor::locator::{find_exact, find_whitespace_tolerant};
use crate::anchor::{reconstruct, ClauseSpan, Span, SpanError, TextLocator};

/// Characters of raw output kept in the parse-failure log line
const RAW_PREVIEW_CHARS: usize = 100;

/// Turn a parsed response into alignment records.
///
/// An unparseable response yields exactly one parse-failure record so
/// callers can tell "nothing could be aligned" from "no topics".
pub fn resolve_records(
    locator: &TextLocator,
    parsed: ParsedResponse,
    doc_a: &str,
    doc_b: &str,
) -> Vec<AlignmentRecord> {
    match parsed {
        ParsedResponse::Records(records) => records
            .iter()
            .map(|record| resolve_record(locator, record, doc_a, doc_b))
            .collect(),
        ParsedResponse::Unparseable { raw } => {
            let preview: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
            warn!(%preview, "Could not parse model output");
            vec![AlignmentRecord::parse_failure(raw)]
        }
    }
}

/// Resolve both sides of one parsed record
pub fn resolve_record(
    locator: &TextLocator,
    record: &ParsedRecord,
    doc_a: &str,
    doc_b: &str,
) -> AlignmentRecord {
    let side_a = resolve_clause(locator, doc_a, &record.doc_a);
    let side_b = resolve_clause(locator, doc_b, &record.doc_b);
    debug!(
        topic = %record.topic,
        doc_a_error = side_a.is_error(),
        doc_b_error = side_b.is_error(),
        "Resolved alignment record"
    );
    AlignmentRecord::new(record.topic.clone(), side_a, side_b)
}

/// Resolve one side against its document
pub fn resolve_clause(locator: &TextLocator, document: &str, clause: &ClauseRef) -> ClauseSpan {
    match clause {
        ClauseRef::Anchors { start, end } => reconstruct(locator, document, start, end),
        ClauseRef::Quote { text } => verify_quote(document, text),
        ClauseRef::NotApplicable => ClauseSpan::NotApplicable,
    }
}

/// Check that copied clause text occurs in the document.
///
/// Exact first, then with whitespace runs relaxed. The unverified text is
/// kept in the error so nothing the model produced is lost.
pub fn verify_quote(document: &str, quote: &str) -> ClauseSpan {
    let found = find_exact(document, quote, 0).or_else(|| find_whitespace_tolerant(document, quote, 0));

    match found.and_then(|m| Span::from_document(document, m.offset, m.end)) {
        Some(span) => ClauseSpan::Found(span),
        None => {
            warn!(quote_len = quote.len(), "Quoted text not found in document");
            ClauseSpan::error(SpanError::QuoteNotFound {
                quote: quote.to_string(),
            })
        }
    }
}

/// Verification counts over a set of alignment records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationSummary {
    pub topics: usize,
    /// Sides whose span still matches its document
    pub verified_sides: usize,
    pub not_applicable_sides: usize,
    /// Sides that carry an error
    pub failed_sides: usize,
    /// Spans whose offsets, text, or hash no longer match the document
    pub stale_spans: usize,
    /// Records with at least one failed or stale side
    pub failed_records: usize,
    pub parse_failure: bool,
}

impl VerificationSummary {
    /// Share of topics reconstructed without any failure, as a percentage
    pub fn accuracy(&self) -> Option<f64> {
        if self.topics == 0 {
            return None;
        }
        let ok = self.topics - self.failed_records;
        Some(ok as f64 * 100.0 / self.topics as f64)
    }
}

/// Re-check every span against the documents it claims to come from
pub fn verify_records(records: &[AlignmentRecord], doc_a: &str, doc_b: &str) -> VerificationSummary {
    let mut summary = VerificationSummary::default();

    for record in records {
        if record.is_parse_failure() {
            summary.parse_failure = true;
            continue;
        }
        summary.topics += 1;

        let mut record_failed = false;
        for (side, document) in [(&record.doc_a, doc_a), (&record.doc_b, doc_b)] {
            match side {
                ClauseSpan::Found(span) if span.verify(document) => summary.verified_sides += 1,
                ClauseSpan::Found(_) => {
                    summary.stale_spans += 1;
                    record_failed = true;
                }
                ClauseSpan::NotApplicable => summary.not_applicable_sides += 1,
                ClauseSpan::Error { .. } => {
                    summary.failed_sides += 1;
                    record_failed = true;
                }
            }
        }
        if record_failed {
            summary.failed_records += 1;
        }
    }

    summary
}

//! Topics present in the stronger document but absent from the weaker one.

use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentRecord;
use crate::anchor::ClauseSpan;

/// A topic the weaker document (doc B) lacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTopicItem {
    pub topic: String,
    /// Clause text from doc A the new clause should cover
    pub target_content: String,
}

/// Collect topics whose doc B side is not applicable or empty while the
/// doc A side has text. Input order is preserved; it decides insertion
/// order later.
///
/// A doc B side that failed to resolve is not treated as missing: the
/// clause may well exist, the anchors just could not be placed.
pub fn find_missing(records: &[AlignmentRecord]) -> Vec<MissingTopicItem> {
    records
        .iter()
        .filter(|record| is_absent(&record.doc_b))
        .filter_map(|record| {
            let span = record.doc_a.span().filter(|_| record.doc_a.has_text())?;
            Some(MissingTopicItem {
                topic: record.topic.clone(),
                target_content: span.text.clone(),
            })
        })
        .collect()
}

fn is_absent(side: &ClauseSpan) -> bool {
    match side {
        ClauseSpan::NotApplicable => true,
        ClauseSpan::Found(span) => span.text.trim().is_empty(),
        ClauseSpan::Error { .. } => false,
    }
}

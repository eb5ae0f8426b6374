//! Clause span reconstruction from a start and an end anchor.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::locator::{AnchorRole, EndBoundary, Strategy, TextLocator};
use super::spans::{floor_char_boundary, Span};

/// Literal the model uses for "no counterpart in this document"
pub const NOT_APPLICABLE: &str = "N/A";

/// True for `N/A` (any case) and for empty or whitespace-only values
pub fn is_not_applicable(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(NOT_APPLICABLE)
}

/// A boundary phrase supplied by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Phrase(String),
    NotApplicable,
}

impl Anchor {
    /// Interpret a raw model value, mapping the N/A sentinel
    pub fn parse(raw: &str) -> Self {
        if is_not_applicable(raw) {
            Anchor::NotApplicable
        } else {
            Anchor::Phrase(raw.trim().to_string())
        }
    }

    pub fn as_phrase(&self) -> Option<&str> {
        match self {
            Anchor::Phrase(phrase) => Some(phrase),
            Anchor::NotApplicable => None,
        }
    }
}

/// Why one side of an alignment has no span
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanError {
    #[error("Start anchor '{anchor}' not found")]
    StartAnchorNotFound { anchor: String },

    #[error("End anchor '{anchor}' not found after start")]
    EndAnchorNotFound { anchor: String },

    #[error("Quoted text not found in document: '{}'", preview(.quote))]
    QuoteNotFound { quote: String },

    #[error("Could not parse model output")]
    ParseFailure { raw: String },
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 50;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    }
}

/// One side of an alignment: a verified span, a sentinel, or a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClauseSpan {
    Found(Span),
    NotApplicable,
    Error { error: SpanError },
}

impl ClauseSpan {
    pub fn error(error: SpanError) -> Self {
        ClauseSpan::Error { error }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            ClauseSpan::Found(span) => Some(span),
            _ => None,
        }
    }

    /// Present and non-empty text
    pub fn has_text(&self) -> bool {
        self.span().is_some_and(|span| !span.text.trim().is_empty())
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, ClauseSpan::NotApplicable)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ClauseSpan::Error { .. })
    }
}

impl fmt::Display for ClauseSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseSpan::Found(span) => f.write_str(&span.text),
            ClauseSpan::NotApplicable => f.write_str(NOT_APPLICABLE),
            ClauseSpan::Error { error } => write!(f, "[Error: {}]", error),
        }
    }
}

/// Recover the verbatim clause between two anchors.
///
/// The start anchor is searched from the top of the document, the end
/// anchor from the resolved start, so `end >= start` always holds. The end
/// anchor's text is part of the clause.
pub fn reconstruct(
    locator: &TextLocator,
    document: &str,
    start_anchor: &Anchor,
    end_anchor: &Anchor,
) -> ClauseSpan {
    let (Some(start_phrase), Some(end_phrase)) = (start_anchor.as_phrase(), end_anchor.as_phrase())
    else {
        return ClauseSpan::NotApplicable;
    };

    let Some(start) = locator.locate(document, start_phrase, 0, AnchorRole::Start) else {
        warn!(anchor = start_phrase, "Start anchor not found");
        return ClauseSpan::error(SpanError::StartAnchorNotFound {
            anchor: start_phrase.to_string(),
        });
    };

    let Some(end) = locator.locate(document, end_phrase, start.offset, AnchorRole::End) else {
        warn!(anchor = end_phrase, start = start.offset, "End anchor not found after start");
        return ClauseSpan::error(SpanError::EndAnchorNotFound {
            anchor: end_phrase.to_string(),
        });
    };

    let boundary = match (end.strategy, locator.config().end_boundary) {
        (Strategy::Exact, _) | (_, EndBoundary::MatchedLength) => end.end,
        // Heuristic: the literal anchor length, not the matched length
        (_, EndBoundary::AnchorLength) => end.offset + end_phrase.len(),
    };
    let boundary = floor_char_boundary(document, boundary).max(start.offset);

    match Span::from_document(document, start.offset, boundary) {
        Some(span) => ClauseSpan::Found(span),
        None => ClauseSpan::error(SpanError::EndAnchorNotFound {
            anchor: end_phrase.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::locator::LocatorConfig;

    const DOC: &str = "1. Confidentiality\nRecipient agrees to hold information secret.\n2. Term\nThis lasts 2 years.";

    fn phrase(s: &str) -> Anchor {
        Anchor::Phrase(s.to_string())
    }

    #[test]
    fn test_anchor_parse() {
        assert_eq!(Anchor::parse("N/A"), Anchor::NotApplicable);
        assert_eq!(Anchor::parse(" n/a "), Anchor::NotApplicable);
        assert_eq!(Anchor::parse("   "), Anchor::NotApplicable);
        assert_eq!(Anchor::parse(" The Recipient "), phrase("The Recipient"));
    }

    #[test]
    fn test_reconstruct_inclusive_of_end_anchor() {
        let locator = TextLocator::default();
        let result = reconstruct(&locator, DOC, &phrase("Recipient agrees"), &phrase("information secret."));
        let span = result.span().unwrap();
        assert_eq!(span.text, "Recipient agrees to hold information secret.");
        assert!(span.verify(DOC));
    }

    #[test]
    fn test_not_applicable_short_circuits() {
        let locator = TextLocator::default();
        assert_eq!(
            reconstruct(&locator, DOC, &Anchor::NotApplicable, &phrase("secret.")),
            ClauseSpan::NotApplicable
        );
        assert_eq!(
            reconstruct(&locator, DOC, &phrase("Recipient"), &Anchor::NotApplicable),
            ClauseSpan::NotApplicable
        );
    }

    #[test]
    fn test_distinct_start_and_end_failures() {
        let locator = TextLocator::default();

        let missing_start = reconstruct(&locator, DOC, &phrase("Governing law"), &phrase("secret."));
        assert_eq!(
            missing_start,
            ClauseSpan::error(SpanError::StartAnchorNotFound {
                anchor: "Governing law".to_string()
            })
        );

        // "Confidentiality" only occurs before the start anchor
        let missing_end = reconstruct(&locator, DOC, &phrase("2. Term"), &phrase("Confidentiality"));
        assert_eq!(
            missing_end,
            ClauseSpan::error(SpanError::EndAnchorNotFound {
                anchor: "Confidentiality".to_string()
            })
        );
        assert_eq!(
            missing_end.to_string(),
            "[Error: End anchor 'Confidentiality' not found after start]"
        );
    }

    #[test]
    fn test_end_boundary_policies() {
        let doc = "Start here and the clause ends\n\nwith this. Trailing text.";

        let literal = TextLocator::default();
        let result = reconstruct(&literal, doc, &phrase("Start here"), &phrase("ends with this."));
        // Whitespace tier matched "ends\n\nwith this." (one byte longer)
        assert_eq!(result.span().unwrap().text, "Start here and the clause ends\n\nwith this");

        let matched = TextLocator::new(LocatorConfig {
            end_boundary: EndBoundary::MatchedLength,
            ..Default::default()
        });
        let result = reconstruct(&matched, doc, &phrase("Start here"), &phrase("ends with this."));
        assert_eq!(result.span().unwrap().text, "Start here and the clause ends\n\nwith this.");
    }

    #[test]
    fn test_anchor_length_is_clamped_to_document() {
        let doc = "Short clause ends with x";
        let locator = TextLocator::default();
        // Falls back to the last word "x"; anchor length runs past the end
        let result = reconstruct(&locator, doc, &phrase("Short clause"), &phrase("qqqqqq rrrrrr x"));
        assert_eq!(result.span().unwrap().text, doc);
    }
}

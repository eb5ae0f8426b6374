//! Choosing where a generated clause goes.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::anchor::{Strategy, TextLocator};
use crate::prompts::PRECEDING_SNIPPET_MARKER;

/// Text placed before an inserted clause
pub const DEFAULT_PREFIX: &str = "\n\n";

/// Text placed after an inserted clause
pub const DEFAULT_SUFFIX: &str = "\n";

/// How the insertion offset was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionResolution {
    /// Snippet found verbatim; offset is its end
    Exact,
    /// Snippet found approximately; offset is the end of the match
    Fuzzy,
    /// No usable snippet; clause appended at end of document
    AppendFallback,
}

/// Where and how to splice text into a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionPlan {
    /// Byte offset the insertion goes in front of
    pub offset: usize,
    pub prefix: String,
    pub suffix: String,
    pub resolution: InsertionResolution,
    /// Snippet the model proposed, if any
    pub snippet: Option<String>,
}

impl InsertionPlan {
    fn new(offset: usize, resolution: InsertionResolution, snippet: Option<String>) -> Self {
        Self {
            offset,
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            resolution,
            snippet,
        }
    }

    /// Plan that appends to the end of `document`
    pub fn append(document: &str, snippet: Option<String>) -> Self {
        Self::new(document.len(), InsertionResolution::AppendFallback, snippet)
    }

    /// Splice `clause` into `document`, returning the new text
    pub fn apply(&self, document: &str, clause: &str) -> String {
        let offset = self.offset.min(document.len());
        let mut out =
            String::with_capacity(document.len() + self.prefix.len() + clause.len() + self.suffix.len());
        out.push_str(&document[..offset]);
        out.push_str(&self.prefix);
        out.push_str(clause);
        out.push_str(&self.suffix);
        out.push_str(&document[offset..]);
        out
    }
}

/// Pull the snippet out of the model's insertion-point answer.
///
/// Takes the text after the first marker (up to any second marker), trims
/// it, and drops one pair of surrounding double quotes. `None` when the
/// marker is absent or nothing follows it.
pub fn parse_snippet(response: &str) -> Option<String> {
    let (_, after) = response.split_once(PRECEDING_SNIPPET_MARKER)?;
    let after = after
        .split_once(PRECEDING_SNIPPET_MARKER)
        .map_or(after, |(first, _)| first);

    let mut snippet = after.trim();
    if snippet.len() >= 2 && snippet.starts_with('"') && snippet.ends_with('"') {
        snippet = &snippet[1..snippet.len() - 1];
    }

    if snippet.is_empty() {
        None
    } else {
        Some(snippet.to_string())
    }
}

/// Resolve an insertion offset from the model's answer.
///
/// Exact search, then fuzzy search bounded by the snippet length; the
/// offset is the end of the match so the clause lands right after the
/// snippet. Anything else appends.
pub fn plan_insertion(locator: &TextLocator, document: &str, response: Option<&str>) -> InsertionPlan {
    let Some(snippet) = response.and_then(parse_snippet) else {
        warn!("Insertion point not given; appending clause");
        return InsertionPlan::append(document, None);
    };

    match locator.locate_snippet(document, &snippet) {
        Some(m) => {
            let resolution = if m.strategy == Strategy::Exact {
                InsertionResolution::Exact
            } else {
                InsertionResolution::Fuzzy
            };
            debug!(offset = m.end, distance = m.distance, ?resolution, "Insertion point resolved");
            InsertionPlan::new(m.end, resolution, Some(snippet))
        }
        None => {
            warn!(%snippet, "Insertion snippet not found; appending clause");
            InsertionPlan::append(document, Some(snippet))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "1. Confidentiality\nReceiving party shall not disclose data.\n2. Remedies\nInjunctive relief applies.";

    #[test]
    fn test_parse_snippet() {
        assert_eq!(
            parse_snippet("Sure.\nPRECEDING_SNIPPET: \"shall not disclose data.\"\n"),
            Some("shall not disclose data.".to_string())
        );
        assert_eq!(
            parse_snippet("PRECEDING_SNIPPET: a PRECEDING_SNIPPET: b"),
            Some("a".to_string())
        );
        // Only a matched pair of quotes is stripped
        assert_eq!(parse_snippet("PRECEDING_SNIPPET: \"x"), Some("\"x".to_string()));
        assert_eq!(parse_snippet("PRECEDING_SNIPPET:   "), None);
        assert_eq!(parse_snippet("I could not decide."), None);
    }

    #[test]
    fn test_exact_snippet_inserts_after_match() {
        let locator = TextLocator::default();
        let plan = plan_insertion(&locator, DOC, Some("PRECEDING_SNIPPET: shall not disclose data."));
        assert_eq!(plan.resolution, InsertionResolution::Exact);
        assert_eq!(&DOC[..plan.offset], "1. Confidentiality\nReceiving party shall not disclose data.");
    }

    #[test]
    fn test_fuzzy_snippet() {
        let locator = TextLocator::default();
        let plan = plan_insertion(&locator, DOC, Some("PRECEDING_SNIPPET: shall not disclose dta."));
        assert_eq!(plan.resolution, InsertionResolution::Fuzzy);
        assert_eq!(&DOC[..plan.offset], "1. Confidentiality\nReceiving party shall not disclose data.");
    }

    #[test]
    fn test_fallbacks_append() {
        let locator = TextLocator::default();

        let missing = plan_insertion(&locator, DOC, Some("PRECEDING_SNIPPET: Governing law of Delaware"));
        assert_eq!(missing.resolution, InsertionResolution::AppendFallback);
        assert_eq!(missing.offset, DOC.len());
        assert_eq!(missing.snippet.as_deref(), Some("Governing law of Delaware"));

        let no_marker = plan_insertion(&locator, DOC, Some("After section 1."));
        assert_eq!(no_marker.offset, DOC.len());

        let no_response = plan_insertion(&locator, DOC, None);
        assert_eq!(no_response.resolution, InsertionResolution::AppendFallback);
    }

    #[test]
    fn test_apply() {
        let plan = InsertionPlan::new(5, InsertionResolution::Exact, None);
        assert_eq!(plan.apply("AAAAABBBBB", "NEW"), "AAAAA\n\nNEW\nBBBBB");

        let append = InsertionPlan::append("doc", None);
        assert_eq!(append.apply("doc", "NEW"), "doc\n\nNEW\n");
    }
}

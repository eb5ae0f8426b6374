//! Tiered anchor search.
//!
//! A model asked to quote the first or last words of a clause gets them
//! mostly right. The locator tries progressively looser strategies and
//! reports which one succeeded:
//!
//! 1. Exact substring
//! 2. Whitespace-tolerant pattern (every whitespace run matches `\s+`)
//! 3. Approximate match within a bounded edit distance
//! 4. First word (start anchors) or last word (end anchors) only
//!
//! Every tier searches forward from the caller's offset and returns the
//! leftmost hit. The locator is pure: no I/O, no shared state.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fuzzy::find_near_match;
use super::spans::floor_char_boundary;

/// Strategy that produced a match, from most to least confident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Exact,
    WhitespaceTolerant,
    Fuzzy,
    FallbackFirstWord,
    FallbackLastWord,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Exact => "exact",
            Strategy::WhitespaceTolerant => "whitespace-tolerant",
            Strategy::Fuzzy => "fuzzy",
            Strategy::FallbackFirstWord => "fallback-first-word",
            Strategy::FallbackLastWord => "fallback-last-word",
        }
    }
}

/// Which clause boundary an anchor marks; selects the word kept by the
/// fallback tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRole {
    Start,
    End,
}

/// Where an anchor was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorMatch {
    /// Start byte offset of the matched text
    pub offset: usize,
    /// End byte offset (exclusive) of the matched text
    pub end: usize,
    /// Tier that produced the match
    pub strategy: Strategy,
    /// Edit distance to the anchor (0 unless fuzzy)
    pub distance: usize,
}

/// How the end of a reconstructed clause is computed when the end anchor
/// was not matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBoundary {
    /// `match offset + literal anchor length`; may be off by a few
    /// characters after a whitespace, fuzzy, or fallback match
    #[default]
    AnchorLength,
    /// End of the text the locator actually matched
    MatchedLength,
}

/// Matching settings (the `matching` section of the config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Run the approximate tier (default: true)
    #[serde(default = "default_true")]
    pub fuzzy_enabled: bool,

    /// Edit distance allowed for short anchors (default: 2)
    #[serde(default = "default_anchor_max_distance")]
    pub anchor_max_distance: usize,

    /// Upper bound on edit distance for insertion snippets (default: 5)
    #[serde(default = "default_snippet_max_distance")]
    pub snippet_max_distance: usize,

    /// Snippet edit distance as a fraction of its length (default: 0.2)
    #[serde(default = "default_snippet_distance_ratio")]
    pub snippet_distance_ratio: f64,

    /// Run the first/last word tier (default: true)
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,

    /// End-of-clause policy for non-exact end matches
    #[serde(default)]
    pub end_boundary: EndBoundary,
}

fn default_true() -> bool {
    true
}
fn default_anchor_max_distance() -> usize {
    2
}
fn default_snippet_max_distance() -> usize {
    5
}
fn default_snippet_distance_ratio() -> f64 {
    0.2
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            fuzzy_enabled: true,
            anchor_max_distance: default_anchor_max_distance(),
            snippet_max_distance: default_snippet_max_distance(),
            snippet_distance_ratio: default_snippet_distance_ratio(),
            fallback_enabled: true,
            end_boundary: EndBoundary::default(),
        }
    }
}

impl LocatorConfig {
    /// Edit distance allowed for a snippet of `len` characters:
    /// `min(snippet_max_distance, floor(len * ratio))`
    pub fn snippet_distance(&self, len: usize) -> usize {
        let proportional = (len as f64 * self.snippet_distance_ratio).floor() as usize;
        proportional.min(self.snippet_max_distance)
    }
}

/// Finds anchor phrases in document text
#[derive(Debug, Clone, Default)]
pub struct TextLocator {
    config: LocatorConfig,
}

impl TextLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Locate an anchor at or after `from`, trying each tier in order.
    ///
    /// Callers short-circuit "not applicable" anchors before getting here;
    /// an empty anchor simply finds nothing.
    pub fn locate(
        &self,
        document: &str,
        anchor: &str,
        from: usize,
        role: AnchorRole,
    ) -> Option<AnchorMatch> {
        let anchor = anchor.trim();
        if anchor.is_empty() {
            return None;
        }
        let from = floor_char_boundary(document, from);

        let found = find_exact(document, anchor, from)
            .or_else(|| find_whitespace_tolerant(document, anchor, from))
            .or_else(|| {
                if self.config.fuzzy_enabled {
                    find_fuzzy(document, anchor, from, self.config.anchor_max_distance)
                } else {
                    None
                }
            })
            .or_else(|| {
                if self.config.fallback_enabled {
                    find_fallback_word(document, anchor, from, role)
                } else {
                    None
                }
            });

        match &found {
            Some(m) if m.strategy != Strategy::Exact => {
                debug!(
                    anchor,
                    strategy = m.strategy.as_str(),
                    distance = m.distance,
                    offset = m.offset,
                    "Anchor located by non-exact tier"
                );
            }
            Some(_) => {}
            None => debug!(anchor, from, "Anchor not located by any tier"),
        }

        found
    }

    /// Locate an insertion snippet: exact, then fuzzy with a length-scaled
    /// bound. No whitespace or word fallback; a miss means "append".
    pub fn locate_snippet(&self, document: &str, snippet: &str) -> Option<AnchorMatch> {
        if snippet.is_empty() {
            return None;
        }

        find_exact(document, snippet, 0).or_else(|| {
            if !self.config.fuzzy_enabled {
                return None;
            }
            let max_distance = self.config.snippet_distance(snippet.chars().count());
            find_fuzzy(document, snippet, 0, max_distance)
        })
    }
}

/// Tier 1: exact substring search from `from`
pub fn find_exact(document: &str, needle: &str, from: usize) -> Option<AnchorMatch> {
    let haystack = document.get(from..)?;
    haystack.find(needle).map(|idx| AnchorMatch {
        offset: from + idx,
        end: from + idx + needle.len(),
        strategy: Strategy::Exact,
        distance: 0,
    })
}

/// Build the whitespace-tolerant pattern for an anchor.
///
/// Returns `None` for anchors with a single token, where the pattern
/// would be the same as an exact search.
pub fn whitespace_pattern(anchor: &str) -> Option<String> {
    let tokens: Vec<String> = anchor.split_whitespace().map(regex::escape).collect();
    if tokens.len() < 2 {
        return None;
    }
    Some(tokens.join(r"\s+"))
}

/// Tier 2: whitespace runs in the anchor match any whitespace run
pub fn find_whitespace_tolerant(document: &str, anchor: &str, from: usize) -> Option<AnchorMatch> {
    let pattern = whitespace_pattern(anchor)?;
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(anchor, error = %e, "Failed to build whitespace-tolerant pattern");
            return None;
        }
    };

    re.find_at(document, from).map(|m| AnchorMatch {
        offset: m.start(),
        end: m.end(),
        strategy: Strategy::WhitespaceTolerant,
        distance: 0,
    })
}

/// Tier 3: leftmost approximate match within `max_distance` edits
pub fn find_fuzzy(
    document: &str,
    anchor: &str,
    from: usize,
    max_distance: usize,
) -> Option<AnchorMatch> {
    if max_distance == 0 {
        return None;
    }
    find_near_match(document, anchor, from, max_distance).map(|m| AnchorMatch {
        offset: m.start,
        end: m.end,
        strategy: Strategy::Fuzzy,
        distance: m.distance,
    })
}

/// Tier 4: exact search for the anchor's first (start) or last (end) word.
///
/// Lowest confidence; common words can produce false positives.
pub fn find_fallback_word(
    document: &str,
    anchor: &str,
    from: usize,
    role: AnchorRole,
) -> Option<AnchorMatch> {
    let mut words = anchor.split_whitespace();
    let (word, strategy) = match role {
        AnchorRole::Start => (words.next()?, Strategy::FallbackFirstWord),
        AnchorRole::End => (words.last()?, Strategy::FallbackLastWord),
    };

    // A single-word anchor was already tried verbatim
    if word == anchor {
        return None;
    }

    find_exact(document, word, from).map(|m| AnchorMatch { strategy, ..m })
}

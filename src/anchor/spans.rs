//! Span values and span utilities.
//!
//! A [`Span`] is a value copy of a slice of a document: the offsets are
//! only meaningful against the exact document text they were taken from.
//!
//! # Conventions
//!
//! - **UTF-8 byte offsets**: all offsets index the document's bytes and
//!   always fall on character boundaries
//! - **Hash verification**: each span records `slice_sha256` so a caller
//!   can detect that the document changed underneath it

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A contiguous, verbatim slice of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// `document[start..end]`
    pub text: String,
    /// SHA256 hash of the slice bytes
    pub slice_sha256: String,
}

impl Span {
    /// Slice `document[start..end]` into a span.
    ///
    /// Returns `None` when the range is inverted, out of bounds, or does not
    /// sit on character boundaries.
    pub fn from_document(document: &str, start: usize, end: usize) -> Option<Self> {
        let text = document.get(start..end)?;
        Some(Self {
            start,
            end,
            text: text.to_string(),
            slice_sha256: compute_hash(text.as_bytes()),
        })
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check that this span still describes `document`
    pub fn verify(&self, document: &str) -> bool {
        match document.get(self.start..self.end) {
            Some(slice) => {
                slice == self.text && compute_hash(slice.as_bytes()) == self.slice_sha256
            }
            None => false,
        }
    }
}

/// Compute SHA256 hash of a byte slice, returning hex string with prefix
///
/// # Returns
/// * String in format "sha256:abc123..."
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Move `offset` back to the nearest character boundary at or before it,
/// clamped to the document length.
pub fn floor_char_boundary(document: &str, offset: usize) -> usize {
    let mut offset = offset.min(document.len());
    while offset > 0 && !document.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Extract context around a span
///
/// Returns roughly `window` bytes of text centred on the span, with
/// ellipses marking truncation.
///
/// # Arguments
/// * `document` - The full document text
/// * `start` - Start byte offset of span
/// * `end` - End byte offset of span
/// * `window` - Total bytes of context
pub fn extract_context(document: &str, start: usize, end: usize, window: usize) -> String {
    let len = document.len();
    let start = floor_char_boundary(document, start);
    let end = floor_char_boundary(document, end.max(start));

    let span_len = end - start;
    let remaining = window.saturating_sub(span_len);
    let each_side = remaining / 2;

    let context_start = floor_char_boundary(document, start.saturating_sub(each_side));

    // Expand forwards, respecting UTF-8 boundaries
    let mut context_end = (end + each_side).min(len);
    while context_end < len && !document.is_char_boundary(context_end) {
        context_end += 1;
    }

    let prefix = if context_start > 0 { "..." } else { "" };
    let suffix = if context_end < len { "..." } else { "" };

    format!("{}{}{}", prefix, &document[context_start..context_end], suffix)
}

/// Line and column position (1-indexed for editor compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert byte offset to line/column position
///
/// Column counts characters, not bytes.
pub fn offset_to_line_col(document: &str, offset: usize) -> LineCol {
    let offset = floor_char_boundary(document, offset);
    let prefix = &document[..offset];

    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = document[line_start..offset].chars().count() + 1;

    LineCol { line, col }
}

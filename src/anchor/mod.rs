//! Anchor-based text reconstruction.
//!
//! A language model describes where a clause starts and ends with a few
//! words on each side. This module turns that description back into the
//! exact verbatim slice of the source document, tolerating reflowed
//! whitespace, extraction artifacts, and small typos.
//!
//! # Design Principles
//!
//! - **Tiered confidence**: exact, whitespace-tolerant, fuzzy, then a
//!   single-word fallback; every match reports the tier that produced it.
//! - **Honest failure**: an anchor no tier can find becomes a typed
//!   [`SpanError`] carrying the anchor text, never a silently dropped topic.
//! - **Value spans**: a [`Span`] copies its text and hash; it never borrows
//!   the document.
//!
//! # Example
//!
//! ```
//! use clausealign::anchor::{reconstruct, Anchor, TextLocator};
//!
//! let doc = "1. Confidentiality\nRecipient agrees to hold\ninformation secret.\n";
//! let locator = TextLocator::default();
//! let clause = reconstruct(
//!     &locator,
//!     doc,
//!     &Anchor::parse("Recipient agrees"),
//!     &Anchor::parse("information secret."),
//! );
//! assert_eq!(
//!     clause.span().unwrap().text,
//!     "Recipient agrees to hold\ninformation secret."
//! );
//! ```

pub mod fuzzy;
pub mod locator;
pub mod reconstruct;
pub mod spans;

pub use locator::{AnchorMatch, AnchorRole, EndBoundary, LocatorConfig, Strategy, TextLocator};
pub use reconstruct::{
    is_not_applicable, reconstruct, Anchor, ClauseSpan, SpanError, NOT_APPLICABLE,
};
pub use spans::{compute_hash, extract_context, offset_to_line_col, LineCol, Span};

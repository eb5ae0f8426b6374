//! Filling in topics the weaker document lacks.
//!
//! [`find_missing`] picks the topics, [`augment_document`] drafts and
//! places a clause for each, and [`plan_insertion`] turns the model's
//! "preceding snippet" answer into a byte offset.

pub mod augmenter;
pub mod insertion;
pub mod missing;

pub use augmenter::{augment_document, Augmentation, AugmentReport, Insertion, SkippedTopic};
pub use insertion::{parse_snippet, plan_insertion, InsertionPlan, InsertionResolution};
pub use missing::{find_missing, MissingTopicItem};

//! Sequential augmentation of the weaker document.
//!
//! For each missing topic, in order: draft a clause in the weaker
//! document's style, ask where it goes, and splice it in. Each insertion
//! point is searched in the document as already augmented by the earlier
//! topics, while the style sample always comes from the untouched text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::insertion::{plan_insertion, InsertionPlan, InsertionResolution};
use super::missing::MissingTopicItem;
use crate::anchor::TextLocator;
use crate::core::session::{is_fatal, GenerationSession};
use crate::prompts;

/// A clause added to the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insertion {
    pub topic: String,
    /// The clause as inserted, without surrounding blank lines
    pub text: String,
    /// Byte offset of the insertion in the document as it was at that step
    pub offset: usize,
    pub resolution: InsertionResolution,
}

/// A missing topic that produced no clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTopic {
    pub topic: String,
    pub reason: String,
}

/// Outcome of augmenting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Augmentation {
    pub augmented_text: String,
    pub insertions: Vec<Insertion>,
    pub skipped: Vec<SkippedTopic>,
}

/// Result of one augment operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentReport {
    /// Unique identifier for this operation
    pub operation_id: Uuid,
    pub augmented_text: String,
    pub insertions: Vec<Insertion>,
    pub skipped: Vec<SkippedTopic>,
    pub generation_calls: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl AugmentReport {
    pub fn from_augmentation(
        operation_id: Uuid,
        augmentation: Augmentation,
        generation_calls: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            operation_id,
            augmented_text: augmentation.augmented_text,
            insertions: augmentation.insertions,
            skipped: augmentation.skipped,
            generation_calls,
            started_at,
            completed_at: Utc::now(),
        }
    }
}

/// Add a clause for every missing topic to `mod_text`.
///
/// Per-topic failures are logged and recorded in `skipped`; only limits
/// that end the whole operation return `Err`.
pub async fn augment_document(
    session: &mut GenerationSession<'_>,
    locator: &TextLocator,
    mod_text: &str,
    missing: &[MissingTopicItem],
) -> anyhow::Result<Augmentation> {
    info!(missing = missing.len(), "Augmenting document");

    let style = prompts::style_sample(mod_text);
    let mut augmented_text = mod_text.to_string();
    let mut insertions = Vec::new();
    let mut skipped = Vec::new();

    for item in missing {
        let clause = match draft_clause(session, item, &style).await? {
            Ok(clause) => clause,
            Err(reason) => {
                warn!(topic = %item.topic, %reason, "Skipping missing topic");
                skipped.push(SkippedTopic {
                    topic: item.topic.clone(),
                    reason,
                });
                continue;
            }
        };

        let plan = insertion_plan(session, locator, &augmented_text, &clause, &item.topic).await?;
        augmented_text = plan.apply(&augmented_text, &clause);

        info!(
            topic = %item.topic,
            offset = plan.offset,
            resolution = ?plan.resolution,
            "Inserted clause"
        );
        insertions.push(Insertion {
            topic: item.topic.clone(),
            text: clause,
            offset: plan.offset,
            resolution: plan.resolution,
        });
    }

    Ok(Augmentation {
        augmented_text,
        insertions,
        skipped,
    })
}

/// Draft one clause. The inner `Err` is a skip reason; the outer one is fatal.
async fn draft_clause(
    session: &mut GenerationSession<'_>,
    item: &MissingTopicItem,
    style: &str,
) -> anyhow::Result<Result<String, String>> {
    let prompt = prompts::draft_clause(&item.target_content, style, &item.topic);
    match session.call(&prompt).await {
        Ok(text) => {
            let clause = text.trim();
            if clause.is_empty() {
                Ok(Err("generator returned an empty clause".to_string()))
            } else {
                Ok(Ok(clause.to_string()))
            }
        }
        Err(e) if is_fatal(&e) => Err(e),
        Err(e) => Ok(Err(format!("{:#}", e))),
    }
}

async fn insertion_plan(
    session: &mut GenerationSession<'_>,
    locator: &TextLocator,
    document: &str,
    clause: &str,
    topic: &str,
) -> anyhow::Result<InsertionPlan> {
    let prompt = prompts::insertion_point(document, clause, topic);
    match session.call(&prompt).await {
        Ok(response) => Ok(plan_insertion(locator, document, Some(&response))),
        Err(e) if is_fatal(&e) => Err(e),
        Err(e) => {
            warn!(%topic, error = %format!("{:#}", e), "Insertion point request failed");
            Ok(plan_insertion(locator, document, None))
        }
    }
}

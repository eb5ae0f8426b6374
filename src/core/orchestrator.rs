//! Main orchestrator for align and augment operations.
//!
//! Coordinates generation calls, response parsing, span resolution,
//! and safety limit enforcement. The generator is injected; the
//! orchestrator never builds one from process state.

use std::future::Future;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::Generator;
use crate::alignment::{
    parse_response, resolve_records, AlignmentMode, AlignmentRecord, AlignmentReport,
};
use crate::anchor::{LocatorConfig, TextLocator};
use crate::augment::{augment_document, find_missing, AugmentReport};
use crate::prompts;

use super::safety::{SafetyLimits, SafetyViolation};
use super::session::GenerationSession;

/// Main align/augment orchestrator
pub struct Orchestrator {
    generator: Box<dyn Generator>,
    locator: TextLocator,
    limits: SafetyLimits,
}

impl Orchestrator {
    /// Create an orchestrator with default matching and safety settings
    pub fn new(generator: Box<dyn Generator>) -> Self {
        Self {
            generator,
            locator: TextLocator::default(),
            limits: SafetyLimits::default(),
        }
    }

    pub fn with_locator_config(mut self, config: LocatorConfig) -> Self {
        self.locator = TextLocator::new(config);
        self
    }

    pub fn with_safety_limits(mut self, limits: SafetyLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn locator(&self) -> &TextLocator {
        &self.locator
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Align two documents by topic.
    ///
    /// Fails only when no model response could be obtained; an unusable
    /// response becomes the single parse-failure record.
    #[instrument(skip(self, doc_a, doc_b), fields(mode = %mode, generator = %self.generator.name()))]
    pub async fn align(&self, doc_a: &str, doc_b: &str, mode: AlignmentMode) -> Result<AlignmentReport> {
        self.with_operation_timeout(async {
            let mut session = GenerationSession::new(self.generator.as_ref(), &self.limits);
            self.align_in(&mut session, doc_a, doc_b, mode).await
        })
        .await
    }

    /// Add clauses for the topics `records` show doc B lacking
    #[instrument(skip(self, doc_b, records), fields(record_count = records.len(), generator = %self.generator.name()))]
    pub async fn augment(&self, doc_b: &str, records: &[AlignmentRecord]) -> Result<AugmentReport> {
        self.with_operation_timeout(async {
            let mut session = GenerationSession::new(self.generator.as_ref(), &self.limits);
            self.augment_in(&mut session, doc_b, records).await
        })
        .await
    }

    /// Align, then augment doc B, under a single operation deadline
    #[instrument(skip(self, doc_a, doc_b), fields(mode = %mode, generator = %self.generator.name()))]
    pub async fn align_and_augment(
        &self,
        doc_a: &str,
        doc_b: &str,
        mode: AlignmentMode,
    ) -> Result<(AlignmentReport, AugmentReport)> {
        self.with_operation_timeout(async {
            let mut session = GenerationSession::new(self.generator.as_ref(), &self.limits);
            let alignment = self.align_in(&mut session, doc_a, doc_b, mode).await?;
            let augmented = self.augment_in(&mut session, doc_b, &alignment.records).await?;
            Ok((alignment, augmented))
        })
        .await
    }

    /// Check the generator backend
    pub async fn health_check(&self) -> Result<()> {
        self.generator.health_check().await
    }

    async fn align_in(
        &self,
        session: &mut GenerationSession<'_>,
        doc_a: &str,
        doc_b: &str,
        mode: AlignmentMode,
    ) -> Result<AlignmentReport> {
        let operation_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%operation_id, doc_a_bytes = doc_a.len(), doc_b_bytes = doc_b.len(), "Starting alignment");

        self.limits.validate_document(doc_a, None)?;
        self.limits.validate_document(doc_b, None)?;

        let prompt = prompts::alignment(doc_a, doc_b, mode);
        let raw_response = session.call(&prompt).await.map_err(|e| {
            error!(%operation_id, error = %format!("{:#}", e), "No alignment response");
            e
        })?;

        let records = resolve_records(
            &self.locator,
            parse_response(&raw_response, mode),
            doc_a,
            doc_b,
        );

        let errors = records
            .iter()
            .filter(|r| r.doc_a.is_error() || r.doc_b.is_error())
            .count();
        info!(%operation_id, topics = records.len(), errors, "Alignment completed");

        Ok(AlignmentReport {
            operation_id,
            mode,
            records,
            raw_response,
            started_at,
            completed_at: Utc::now(),
        })
    }

    async fn augment_in(
        &self,
        session: &mut GenerationSession<'_>,
        doc_b: &str,
        records: &[AlignmentRecord],
    ) -> Result<AugmentReport> {
        let operation_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.limits.validate_document(doc_b, None)?;

        let missing = find_missing(records);
        if missing.is_empty() {
            info!(%operation_id, "No missing topics");
        }

        let calls_before = session.tracker().generation_calls;
        let augmentation = augment_document(session, &self.locator, doc_b, &missing).await?;
        let generation_calls = session.tracker().generation_calls - calls_before;

        info!(
            %operation_id,
            inserted = augmentation.insertions.len(),
            skipped = augmentation.skipped.len(),
            added_bytes = augmentation.augmented_text.len() - doc_b.len(),
            "Augmentation completed"
        );

        Ok(AugmentReport::from_augmentation(
            operation_id,
            augmentation,
            generation_calls,
            started_at,
        ))
    }

    /// Run `operation` under the operation deadline. On expiry the future
    /// is dropped along with any partially augmented text.
    async fn with_operation_timeout<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = self.limits.operation_timeout();
        match tokio::time::timeout(limit, operation).await {
            Ok(result) => result,
            Err(_) => {
                warn!(limit_seconds = self.limits.operation_timeout_seconds, "Operation timed out");
                Err(SafetyViolation::OperationTimeout {
                    elapsed_seconds: limit.as_secs(),
                    limit_seconds: self.limits.operation_timeout_seconds,
                }
                .into())
            }
        }
    }
}

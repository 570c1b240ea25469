//! Batch pipeline (application-level orchestration).
//!
//! ```text
//! Orders
//!   ↓
//! 1. Normalize   (drop closed orders and invalid line items)
//!   ↓
//! 2. Consolidate (demand per stock unit + contribution index)
//!   ↓
//! 3. Submit      (one consolidated request; rejection ends the batch)
//!   ↓
//! 4. Reconcile   (deduct demand per stock unit, independently)
//!   ↓
//! 5. Resolve     (per-order disposition)
//!   ↓
//! 6. Propagate   (disposition records to the status sink)
//! ```
//!
//! This module contains no IO itself; it composes the collaborator traits.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, info_span, warn};

use fulfillsync_core::{BatchId, DomainError, OrderId};
use fulfillsync_fulfillment::{
    propagate_all, resolve, BatchSummary, FulfillmentProvider, OrderDisposition,
    PropagationReport, StatusSink, Submission, Submitter,
};
use fulfillsync_inventory::{InventorySystem, ReconciliationReport, Reconciler, ShortagePolicy};
use fulfillsync_sales::{consolidate, normalize, DemandMap, NormalizationStats, Order};

/// Producer of the order snapshot for one batch.
pub trait OrderSource: Send + Sync {
    type Error: core::fmt::Display;

    fn fetch(&self) -> Result<Vec<Order>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The order source could not produce a snapshot.
    #[error("order source failed: {0}")]
    Source(String),

    /// An engine invariant broke (never a business outcome).
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// No order or no valid line item survived normalization.
    NothingToProcess,
    /// The consolidated request was rejected; inventory was not touched.
    SubmissionFailed { reason: String },
    Completed {
        confirmation_id: Option<String>,
        demand: DemandMap,
        reconciliation: ReconciliationReport,
        dispositions: BTreeMap<OrderId, OrderDisposition>,
        summary: BatchSummary,
        propagation: PropagationReport,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub normalization: NormalizationStats,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    /// `true` when the batch as a whole failed (nothing was fulfilled).
    pub fn is_batch_failure(&self) -> bool {
        matches!(self.outcome, BatchOutcome::SubmissionFailed { .. })
    }

    /// `true` when at least one order ended up failed.
    pub fn has_failed_orders(&self) -> bool {
        match &self.outcome {
            BatchOutcome::Completed { summary, .. } => !summary.failed_order_ids.is_empty(),
            _ => false,
        }
    }

    pub fn summary(&self) -> Option<&BatchSummary> {
        match &self.outcome {
            BatchOutcome::Completed { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// One consolidation-and-reconciliation pass per call to [`BatchPipeline::run`].
///
/// Stateless between runs; each batch gets a fresh [`BatchId`].
#[derive(Debug)]
pub struct BatchPipeline<P, I, K> {
    submitter: Submitter<P>,
    reconciler: Reconciler<I>,
    sink: K,
}

impl<P, I, K> BatchPipeline<P, I, K>
where
    P: FulfillmentProvider,
    I: InventorySystem,
    K: StatusSink,
{
    pub fn new(provider: P, inventory: I, sink: K) -> Self {
        Self {
            submitter: Submitter::new(provider),
            reconciler: Reconciler::new(inventory),
            sink,
        }
    }

    pub fn with_shortage_policy(mut self, policy: ShortagePolicy) -> Self {
        self.reconciler = self.reconciler.with_policy(policy);
        self
    }

    /// Fetch a snapshot from `source` and run one batch over it.
    pub fn run_from<S: OrderSource>(&self, source: &S) -> Result<BatchReport, PipelineError> {
        let orders = source
            .fetch()
            .map_err(|e| PipelineError::Source(e.to_string()))?;
        self.run(&orders)
    }

    pub fn run(&self, orders: &[Order]) -> Result<BatchReport, PipelineError> {
        self.run_batch(BatchId::new(), orders)
    }

    /// Run one batch under an explicit identifier.
    pub fn run_batch(
        &self,
        batch_id: BatchId,
        orders: &[Order],
    ) -> Result<BatchReport, PipelineError> {
        let span = info_span!("batch", batch_id = %batch_id);
        let _guard = span.enter();
        let started_at = Utc::now();

        let normalized = normalize(orders);
        let stats = normalized.stats;
        info!(
            received = stats.received,
            accepted = normalized.orders.len(),
            skipped = stats.skipped_orders(),
            dropped_items = stats.dropped_items,
            "orders normalized"
        );

        let finish = |outcome: BatchOutcome| BatchReport {
            batch_id,
            started_at,
            finished_at: Utc::now(),
            normalization: stats,
            outcome,
        };

        if normalized.is_empty() {
            info!("nothing to process");
            return Ok(finish(BatchOutcome::NothingToProcess));
        }

        let (demand, contributions) = consolidate(&normalized.orders).into_parts();
        info!(
            units = demand.len(),
            total = demand.total_units().units(),
            "demand consolidated"
        );

        let confirmation_id = match self.submitter.submit(batch_id, &demand) {
            Submission::Accepted { confirmation_id } => confirmation_id,
            Submission::Rejected { reason } => {
                warn!("fulfillment request not placed; inventory not updated");
                return Ok(finish(BatchOutcome::SubmissionFailed { reason }));
            }
        };

        let reconciliation = self.reconciler.reconcile(&demand);
        let resolution = resolve(&reconciliation, &contributions)?;

        let summary = &resolution.summary;
        if summary.failed_order_ids.is_empty() {
            info!(
                fulfilled = summary.fulfilled_count,
                "all orders fulfilled and inventory updated"
            );
        } else {
            error!(
                fulfilled = summary.fulfilled_count,
                failed = summary.failed_order_ids.len(),
                failed_orders = ?summary.failed_order_ids,
                unmatched_skus = ?summary.unmatched_skus,
                "some orders were not fulfilled"
            );
        }

        let records = resolution.records(confirmation_id.as_deref());
        let propagation = propagate_all(&self.sink, &records);
        if !propagation.is_complete() {
            warn!(
                failed = propagation.failures.len(),
                "some order statuses were not propagated"
            );
        }

        Ok(finish(BatchOutcome::Completed {
            confirmation_id,
            demand,
            reconciliation,
            dispositions: resolution.dispositions,
            summary: resolution.summary,
            propagation,
        }))
    }
}

//! Status propagation back to the sales channel.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use fulfillsync_core::{OrderId, Sku};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispositionStatus {
    Fulfilled,
    Failed,
}

/// Per-order record handed to the [`StatusSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionRecord {
    pub order_id: OrderId,
    pub status: DispositionStatus,
    /// Stock units that prevented fulfillment (empty when fulfilled).
    pub reasons: Vec<Sku>,
    /// Provider-assigned id of the consolidated fulfillment order, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment_order_id: Option<String>,
}

/// Consumer of dispositions (typically the sales channel's order status API).
pub trait StatusSink: Send + Sync {
    type Error: core::fmt::Display;

    fn propagate(&self, record: &DispositionRecord) -> Result<(), Self::Error>;
}

impl<T: StatusSink + ?Sized> StatusSink for &T {
    type Error = T::Error;

    fn propagate(&self, record: &DispositionRecord) -> Result<(), Self::Error> {
        (**self).propagate(record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationFailure {
    pub order_id: OrderId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationReport {
    pub delivered: usize,
    pub failures: Vec<PropagationFailure>,
}

impl PropagationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Hand every record to `sink`. A failure for one order is recorded and the
/// remaining records are still delivered.
pub fn propagate_all<S: StatusSink>(sink: &S, records: &[DispositionRecord]) -> PropagationReport {
    let mut report = PropagationReport::default();

    for record in records {
        match sink.propagate(record) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                error!(order_id = %record.order_id, error = %e, "failed to propagate order status");
                report.failures.push(PropagationFailure {
                    order_id: record.order_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        delivered = report.delivered,
        failed = report.failures.len(),
        "order statuses propagated"
    );
    report
}

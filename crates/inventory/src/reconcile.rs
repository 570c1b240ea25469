use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use fulfillsync_core::{Quantity, Sku};
use fulfillsync_sales::DemandMap;

use crate::system::InventorySystem;

/// What to do when demand exceeds the quantity on hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortagePolicy {
    /// Store `max(0, on_hand - demand)`; the shortage is not an error.
    #[default]
    Clamp,
    /// Leave the record untouched and report a `Shortfall`.
    Reject,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown shortage policy `{0}` (expected `clamp` or `reject`)")]
pub struct UnknownShortagePolicy(pub String);

impl FromStr for ShortagePolicy {
    type Err = UnknownShortagePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(ShortagePolicy::Clamp),
            "reject" => Ok(ShortagePolicy::Reject),
            other => Err(UnknownShortagePolicy(other.to_string())),
        }
    }
}

/// Per-stock-unit result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Reconciled { old_qty: Quantity, new_qty: Quantity },
    /// No inventory record exists for the unit.
    Unmatched,
    /// The inventory read itself failed.
    LookupFailed { reason: String },
    WriteFailed { reason: String },
    /// Demand exceeded on-hand stock under [`ShortagePolicy::Reject`].
    Shortfall { on_hand: Quantity, demanded: Quantity },
}

impl ReconciliationOutcome {
    pub fn is_reconciled(&self) -> bool {
        matches!(self, ReconciliationOutcome::Reconciled { .. })
    }
}

/// Outcome for every demanded stock unit of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReconciliationReport {
    outcomes: BTreeMap<Sku, ReconciliationOutcome>,
}

impl ReconciliationReport {
    pub fn get(&self, sku: &Sku) -> Option<&ReconciliationOutcome> {
        self.outcomes.get(sku)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sku, &ReconciliationOutcome)> + '_ {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn reconciled_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_reconciled()).count()
    }

    pub fn unmatched_skus(&self) -> Vec<Sku> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ReconciliationOutcome::Unmatched))
            .map(|(sku, _)| sku.clone())
            .collect()
    }

    /// Units whose outcome is anything other than `Reconciled`.
    pub fn failed_skus(&self) -> Vec<Sku> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.is_reconciled())
            .map(|(sku, _)| sku.clone())
            .collect()
    }

    pub fn is_fully_reconciled(&self) -> bool {
        self.outcomes.values().all(ReconciliationOutcome::is_reconciled)
    }
}

impl FromIterator<(Sku, ReconciliationOutcome)> for ReconciliationReport {
    fn from_iter<I: IntoIterator<Item = (Sku, ReconciliationOutcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Deducts consolidated demand from an [`InventorySystem`].
///
/// Each stock unit is an independent read-then-write; a miss or failure on one
/// unit is recorded and never stops the remaining units.
#[derive(Debug, Clone)]
pub struct Reconciler<I> {
    inventory: I,
    policy: ShortagePolicy,
}

impl<I: InventorySystem> Reconciler<I> {
    pub fn new(inventory: I) -> Self {
        Self {
            inventory,
            policy: ShortagePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ShortagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reconcile every unit of `demand`. The report has exactly one entry per unit.
    pub fn reconcile(&self, demand: &DemandMap) -> ReconciliationReport {
        let report: ReconciliationReport = demand
            .iter()
            .map(|(sku, qty)| (sku.clone(), self.reconcile_unit(sku, qty)))
            .collect();

        if report.is_fully_reconciled() {
            info!(units = report.len(), "inventory reconciled for all stock units");
        } else {
            error!(
                units = report.len(),
                reconciled = report.reconciled_count(),
                failed = report.failed_skus().len(),
                unmatched = ?report.unmatched_skus(),
                "inventory reconciliation incomplete"
            );
        }
        report
    }

    fn reconcile_unit(&self, sku: &Sku, demand: Quantity) -> ReconciliationOutcome {
        debug!(sku = %sku, demand = demand.units(), "deducting demand from inventory");

        let on_hand = match self.inventory.get_quantity(sku) {
            Ok(Some(qty)) => qty,
            Ok(None) => {
                error!(sku = %sku, "stock unit not found in inventory, cannot deduct");
                return ReconciliationOutcome::Unmatched;
            }
            Err(e) => {
                error!(sku = %sku, error = %e, "inventory lookup failed");
                return ReconciliationOutcome::LookupFailed {
                    reason: e.to_string(),
                };
            }
        };

        if demand > on_hand {
            match self.policy {
                ShortagePolicy::Clamp => {
                    warn!(
                        sku = %sku,
                        on_hand = on_hand.units(),
                        demand = demand.units(),
                        "demand exceeds on-hand stock, clamping to zero"
                    );
                }
                ShortagePolicy::Reject => {
                    error!(
                        sku = %sku,
                        on_hand = on_hand.units(),
                        demand = demand.units(),
                        "demand exceeds on-hand stock, needs backorder handling"
                    );
                    return ReconciliationOutcome::Shortfall {
                        on_hand,
                        demanded: demand,
                    };
                }
            }
        }

        let new_qty = on_hand.saturating_sub(demand);
        match self.inventory.set_quantity(sku, new_qty) {
            Ok(()) => {
                info!(
                    sku = %sku,
                    old_qty = on_hand.units(),
                    new_qty = new_qty.units(),
                    "inventory updated"
                );
                ReconciliationOutcome::Reconciled {
                    old_qty: on_hand,
                    new_qty,
                }
            }
            Err(e) => {
                error!(sku = %sku, error = %e, "failed to update inventory");
                ReconciliationOutcome::WriteFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

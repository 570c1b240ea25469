//! Order status resolution: maps per-unit reconciliation outcomes back onto
//! the orders that contributed to each unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fulfillsync_core::{DomainError, DomainResult, OrderId, Sku};
use fulfillsync_inventory::{ReconciliationOutcome, ReconciliationReport};
use fulfillsync_sales::ContributionIndex;

use crate::propagate::{DispositionRecord, DispositionStatus};

/// Final classification of one order in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderDisposition {
    Fulfilled,
    /// Every non-reconciled unit the order contributed to, with its outcome.
    Failed {
        reasons: BTreeMap<Sku, ReconciliationOutcome>,
    },
}

impl OrderDisposition {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, OrderDisposition::Fulfilled)
    }

    pub fn failed_skus(&self) -> Vec<Sku> {
        match self {
            OrderDisposition::Fulfilled => Vec::new(),
            OrderDisposition::Failed { reasons } => reasons.keys().cloned().collect(),
        }
    }
}

/// Operator-facing counts for a resolved batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub fulfilled_count: usize,
    pub failed_order_ids: Vec<OrderId>,
    pub unmatched_skus: Vec<Sku>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub dispositions: BTreeMap<OrderId, OrderDisposition>,
    pub summary: BatchSummary,
}

impl Resolution {
    /// Records for the status propagation sink, one per order.
    pub fn records(&self, fulfillment_order_id: Option<&str>) -> Vec<DispositionRecord> {
        self.dispositions
            .iter()
            .map(|(order_id, disposition)| DispositionRecord {
                order_id: order_id.clone(),
                status: if disposition.is_fulfilled() {
                    DispositionStatus::Fulfilled
                } else {
                    DispositionStatus::Failed
                },
                reasons: disposition.failed_skus(),
                fulfillment_order_id: fulfillment_order_id.map(str::to_string),
            })
            .collect()
    }
}

/// Resolve every order in `index` against `report`.
///
/// An order fails if *any* unit it contributed to is not reconciled. The report
/// must hold an outcome for every indexed unit; a missing outcome is an
/// invariant violation rather than a silent success.
pub fn resolve(
    report: &ReconciliationReport,
    index: &ContributionIndex,
) -> DomainResult<Resolution> {
    let mut dispositions: BTreeMap<OrderId, OrderDisposition> = BTreeMap::new();

    for (sku, orders) in index.iter() {
        let outcome = report.get(sku).ok_or_else(|| {
            DomainError::invariant(format!("no reconciliation outcome recorded for {sku}"))
        })?;

        for order_id in orders {
            let disposition = dispositions
                .entry(order_id.clone())
                .or_insert(OrderDisposition::Fulfilled);

            if outcome.is_reconciled() {
                continue;
            }
            match disposition {
                OrderDisposition::Fulfilled => {
                    *disposition = OrderDisposition::Failed {
                        reasons: BTreeMap::from([(sku.clone(), outcome.clone())]),
                    };
                }
                OrderDisposition::Failed { reasons } => {
                    reasons.insert(sku.clone(), outcome.clone());
                }
            }
        }
    }

    let fulfilled_count = dispositions.values().filter(|d| d.is_fulfilled()).count();
    let failed_order_ids = dispositions
        .iter()
        .filter(|(_, d)| !d.is_fulfilled())
        .map(|(id, _)| id.clone())
        .collect();

    Ok(Resolution {
        dispositions,
        summary: BatchSummary {
            fulfilled_count,
            failed_order_ids,
            unmatched_skus: report.unmatched_skus(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulfillsync_core::Quantity;
    use std::collections::BTreeSet;
    use fulfillsync_sales::{consolidate, LineItem, NormalizedOrder};
    use proptest::prelude::*;

    fn sku(s: &str) -> Sku {
        Sku::parse(s).unwrap()
    }

    fn oid(s: &str) -> OrderId {
        OrderId::parse(s).unwrap()
    }

    fn order(id: &str, skus: &[&str]) -> NormalizedOrder {
        NormalizedOrder {
            id: oid(id),
            items: skus
                .iter()
                .map(|s| LineItem {
                    sku: sku(s),
                    quantity: Quantity::new(1),
                })
                .collect(),
        }
    }

    /// Orders sharing at least one unit with a non-reconciled outcome.
    fn affected_orders<'a>(
        report: &ReconciliationReport,
        index: &'a ContributionIndex,
    ) -> BTreeSet<&'a OrderId> {
        index
            .iter()
            .filter(|(sku, _)| report.get(sku).is_some_and(|o| !o.is_reconciled()))
            .flat_map(|(_, orders)| orders.iter())
            .collect()
    }

    fn reconciled() -> ReconciliationOutcome {
        ReconciliationOutcome::Reconciled {
            old_qty: Quantity::new(10),
            new_qty: Quantity::new(9),
        }
    }

    #[test]
    fn all_reconciled_means_all_fulfilled() {
        let orders = vec![order("O1", &["X"]), order("O2", &["X"])];
        let index = consolidate(&orders).contributions();
        let report: ReconciliationReport = [(sku("X"), reconciled())].into_iter().collect();

        let resolution = resolve(&report, &index).unwrap();
        assert_eq!(resolution.summary.fulfilled_count, 2);
        assert!(resolution.summary.failed_order_ids.is_empty());
        assert!(resolution.dispositions.values().all(OrderDisposition::is_fulfilled));
    }

    #[test]
    fn unmatched_unit_fails_every_contributor() {
        let orders = vec![order("O1", &["X"]), order("O2", &["X", "Y"]), order("O3", &["Y"])];
        let index = consolidate(&orders).contributions();
        let report: ReconciliationReport = [
            (sku("X"), ReconciliationOutcome::Unmatched),
            (sku("Y"), reconciled()),
        ]
        .into_iter()
        .collect();

        let resolution = resolve(&report, &index).unwrap();
        assert_eq!(resolution.summary.failed_order_ids, vec![oid("O1"), oid("O2")]);
        assert_eq!(resolution.summary.fulfilled_count, 1);
        assert_eq!(resolution.summary.unmatched_skus, vec![sku("X")]);
        assert_eq!(
            resolution.dispositions[&oid("O2")],
            OrderDisposition::Failed {
                reasons: BTreeMap::from([(sku("X"), ReconciliationOutcome::Unmatched)]),
            }
        );
        assert!(resolution.dispositions[&oid("O3")].is_fulfilled());
    }

    #[test]
    fn order_collects_every_failed_unit() {
        let orders = vec![order("O1", &["A", "B", "C"])];
        let index = consolidate(&orders).contributions();
        let write_failed = ReconciliationOutcome::WriteFailed {
            reason: "503".to_string(),
        };
        let report: ReconciliationReport = [
            (sku("A"), ReconciliationOutcome::Unmatched),
            (sku("B"), write_failed.clone()),
            (sku("C"), reconciled()),
        ]
        .into_iter()
        .collect();

        let resolution = resolve(&report, &index).unwrap();
        let disposition = &resolution.dispositions[&oid("O1")];
        assert_eq!(disposition.failed_skus(), vec![sku("A"), sku("B")]);
        match disposition {
            OrderDisposition::Failed { reasons } => {
                assert_eq!(reasons[&sku("B")], write_failed);
            }
            OrderDisposition::Fulfilled => panic!("Expected failed disposition"),
        }
    }

    #[test]
    fn missing_outcome_is_an_invariant_violation() {
        let orders = vec![order("O1", &["X"])];
        let index = consolidate(&orders).contributions();

        let err = resolve(&ReconciliationReport::default(), &index).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("X") => {}
            _ => panic!("Expected InvariantViolation for missing outcome"),
        }
    }

    #[test]
    fn records_carry_status_reasons_and_confirmation() {
        let orders = vec![order("O1", &["X"]), order("O2", &["Y"])];
        let index = consolidate(&orders).contributions();
        let report: ReconciliationReport = [
            (sku("X"), reconciled()),
            (sku("Y"), ReconciliationOutcome::Unmatched),
        ]
        .into_iter()
        .collect();

        let records = resolve(&report, &index).unwrap().records(Some("MCF-9"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, DispositionStatus::Fulfilled);
        assert!(records[0].reasons.is_empty());
        assert_eq!(records[1].status, DispositionStatus::Failed);
        assert_eq!(records[1].reasons, vec![sku("Y")]);
        assert_eq!(records[1].fulfillment_order_id.as_deref(), Some("MCF-9"));
    }

    fn outcome_strategy() -> impl Strategy<Value = ReconciliationOutcome> {
        prop_oneof![
            3 => Just(reconciled()),
            1 => Just(ReconciliationOutcome::Unmatched),
            1 => Just(ReconciliationOutcome::WriteFailed { reason: "x".to_string() }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an order fails exactly when it shares a unit with a
        /// non-reconciled outcome.
        #[test]
        fn failure_attribution_is_complete(
            orders in prop::collection::vec(prop::collection::vec(0usize..5, 1..4), 1..10),
            outcomes in prop::collection::vec(outcome_strategy(), 5),
        ) {
            let orders: Vec<NormalizedOrder> = orders
                .iter()
                .enumerate()
                .map(|(i, skus)| {
                    let names: Vec<String> = skus.iter().map(|s| format!("S{s}")).collect();
                    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                    order(&format!("O{i}"), &refs)
                })
                .collect();
            let index = consolidate(&orders).contributions();
            let report: ReconciliationReport = index
                .iter()
                .map(|(sku, _)| {
                    let n: usize = sku.as_str()[1..].parse().unwrap();
                    (sku.clone(), outcomes[n].clone())
                })
                .collect();

            let resolution = resolve(&report, &index).unwrap();
            let affected = affected_orders(&report, &index);

            for (order_id, disposition) in &resolution.dispositions {
                prop_assert_eq!(!disposition.is_fulfilled(), affected.contains(order_id));
            }
            prop_assert_eq!(resolution.summary.failed_order_ids.len(), affected.len());
            prop_assert_eq!(
                resolution.summary.fulfilled_count + affected.len(),
                orders.len()
            );
        }
    }
}

//! Order normalization: the first stage of a batch.
//!
//! Filters out orders that must not be fulfilled and line items that cannot be,
//! logging every drop. Nothing here is fatal; a batch that normalizes to nothing
//! is simply reported as empty.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use fulfillsync_core::OrderId;

use crate::order::{LineItem, NormalizedOrder, Order};

/// Counters describing what normalization discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub received: usize,
    pub skipped_closed: usize,
    pub skipped_missing_id: usize,
    pub skipped_duplicate: usize,
    pub skipped_without_items: usize,
    pub dropped_items: usize,
}

impl NormalizationStats {
    pub fn skipped_orders(&self) -> usize {
        self.skipped_closed
            + self.skipped_missing_id
            + self.skipped_duplicate
            + self.skipped_without_items
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub orders: Vec<NormalizedOrder>,
    pub stats: NormalizationStats,
}

impl NormalizedBatch {
    /// `true` when there is nothing to fulfill in this batch.
    pub fn is_empty(&self) -> bool {
        self.orders.iter().all(|o| o.items.is_empty())
    }
}

/// Validate and filter a snapshot of raw orders.
///
/// - Orders already fulfilled/shipped/complete are skipped.
/// - Orders without an identifier are skipped.
/// - A repeated order identifier (at-least-once delivery) is skipped; the first
///   delivery wins.
/// - Line items with an empty stock unit or a non-positive quantity are dropped.
/// - An order left without any valid line item is skipped entirely.
///
/// Output preserves input order.
pub fn normalize(orders: &[Order]) -> NormalizedBatch {
    let mut stats = NormalizationStats {
        received: orders.len(),
        ..NormalizationStats::default()
    };
    let mut seen: HashSet<OrderId> = HashSet::new();
    let mut normalized = Vec::with_capacity(orders.len());

    for order in orders {
        if order.status.is_closed() {
            stats.skipped_closed += 1;
            continue;
        }

        let order_id = match order.id.as_deref().map(OrderId::parse) {
            Some(Ok(id)) => id,
            _ => {
                warn!(status = order.status.as_str(), "order missing identifier, skipping");
                stats.skipped_missing_id += 1;
                continue;
            }
        };

        if !seen.insert(order_id.clone()) {
            warn!(order_id = %order_id, "order delivered twice in one batch, skipping duplicate");
            stats.skipped_duplicate += 1;
            continue;
        }

        let mut items = Vec::with_capacity(order.items.len());
        for raw in &order.items {
            match LineItem::try_from(raw) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(
                        order_id = %order_id,
                        sku = raw.sku.as_deref().unwrap_or(""),
                        quantity = raw.quantity,
                        error = %e,
                        "invalid line item dropped"
                    );
                    stats.dropped_items += 1;
                }
            }
        }

        if items.is_empty() {
            warn!(order_id = %order_id, "order has no valid line items, skipping");
            stats.skipped_without_items += 1;
            continue;
        }

        normalized.push(NormalizedOrder { id: order_id, items });
    }

    NormalizedBatch {
        orders: normalized,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderStatus, RawLineItem};
    use fulfillsync_core::Quantity;

    #[test]
    fn closed_orders_are_skipped_case_insensitively() {
        let orders = vec![
            Order::new("O1", OrderStatus::parse("SHIPPED"), vec![RawLineItem::new("X", 1)]),
            Order::new("O2", OrderStatus::parse("Fulfilled"), vec![RawLineItem::new("X", 1)]),
            Order::new("O3", OrderStatus::parse("complete"), vec![RawLineItem::new("X", 1)]),
            Order::pending("O4", vec![RawLineItem::new("X", 1)]),
        ];

        let batch = normalize(&orders);
        assert_eq!(batch.orders.len(), 1);
        assert_eq!(batch.orders[0].id.as_str(), "O4");
        assert_eq!(batch.stats.skipped_closed, 3);
    }

    #[test]
    fn zero_quantity_item_is_dropped_and_order_keeps_valid_items() {
        let orders = vec![Order::pending(
            "O1",
            vec![RawLineItem::new("Y", 0), RawLineItem::new("X", 2)],
        )];

        let batch = normalize(&orders);
        assert_eq!(batch.stats.dropped_items, 1);
        assert_eq!(batch.orders.len(), 1);
        assert_eq!(batch.orders[0].items.len(), 1);
        assert_eq!(batch.orders[0].items[0].sku.as_str(), "X");
        assert_eq!(batch.orders[0].items[0].quantity, Quantity::new(2));
    }

    #[test]
    fn order_without_valid_items_is_skipped_entirely() {
        let orders = vec![Order::pending(
            "O1",
            vec![RawLineItem::new("Y", 0), RawLineItem { sku: None, quantity: 4 }],
        )];

        let batch = normalize(&orders);
        assert!(batch.orders.is_empty());
        assert!(batch.is_empty());
        assert_eq!(batch.stats.dropped_items, 2);
        assert_eq!(batch.stats.skipped_without_items, 1);
    }

    #[test]
    fn missing_and_duplicate_ids_are_skipped() {
        let orders = vec![
            Order {
                id: None,
                status: OrderStatus::Pending,
                items: vec![RawLineItem::new("X", 1)],
            },
            Order::pending("O1", vec![RawLineItem::new("X", 1)]),
            Order::pending("O1", vec![RawLineItem::new("X", 7)]),
        ];

        let batch = normalize(&orders);
        assert_eq!(batch.orders.len(), 1);
        assert_eq!(batch.orders[0].items[0].quantity, Quantity::new(1));
        assert_eq!(batch.stats.skipped_missing_id, 1);
        assert_eq!(batch.stats.skipped_duplicate, 1);
        assert_eq!(batch.stats.skipped_orders(), 2);
    }

    #[test]
    fn malformed_item_is_dropped_without_losing_the_snapshot() {
        for bad in [
            r#"{"sku": "X", "quantity": "two"}"#,
            r#"{"sku": "X", "quantity": null}"#,
            r#"{"sku": "X", "quantity": 1.5}"#,
            r#"{"sku": 123, "quantity": 1}"#,
        ] {
            let json = format!(
                r#"[{{"id": "O1", "status": null, "items": [{bad}]}},
                   {{"id": "O2", "items": [{{"sku": "Z", "quantity": 3}}]}}]"#
            );
            let orders: Vec<Order> = serde_json::from_str(&json).unwrap();

            let batch = normalize(&orders);
            assert_eq!(batch.orders.len(), 1, "for {bad}");
            assert_eq!(batch.orders[0].id.as_str(), "O2");
            assert_eq!(batch.orders[0].items[0].quantity, Quantity::new(3));
            assert_eq!(batch.stats.dropped_items, 1);
            assert_eq!(batch.stats.skipped_without_items, 1);
        }
    }

    #[test]
    fn empty_snapshot_normalizes_to_empty_batch() {
        let batch = normalize(&[]);
        assert!(batch.is_empty());
        assert_eq!(batch.stats, NormalizationStats::default());
    }
}

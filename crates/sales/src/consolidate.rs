//! Cross-order consolidation.
//!
//! Folds validated line items into one demand per stock unit and, in the same
//! pass, records which orders contributed to each unit. Both maps are only ever
//! written together through [`Consolidation::record`], so they cannot diverge.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use fulfillsync_core::{OrderId, Quantity, Sku};

use crate::order::{LineItem, NormalizedOrder};

/// Aggregated requested quantity per stock unit. Every entry is > 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandMap(BTreeMap<Sku, Quantity>);

impl DemandMap {
    pub fn get(&self, sku: &Sku) -> Option<Quantity> {
        self.0.get(sku).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sku, Quantity)> + '_ {
        self.0.iter().map(|(sku, qty)| (sku, *qty))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_units(&self) -> Quantity {
        self.0.values().copied().sum()
    }
}

impl FromIterator<(Sku, Quantity)> for DemandMap {
    /// Builds a demand map, summing repeated stock units and discarding zeros.
    fn from_iter<I: IntoIterator<Item = (Sku, Quantity)>>(iter: I) -> Self {
        let mut map: BTreeMap<Sku, Quantity> = BTreeMap::new();
        for (sku, qty) in iter.into_iter().filter(|(_, q)| !q.is_zero()) {
            let entry = map.entry(sku).or_insert(Quantity::ZERO);
            *entry = entry.saturating_add(qty);
        }
        Self(map)
    }
}

/// Reverse index: stock unit → orders that contributed at least one line item.
///
/// Used for failure attribution only, never for quantity math.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionIndex(BTreeMap<Sku, BTreeSet<OrderId>>);

impl ContributionIndex {
    pub fn contributors(&self, sku: &Sku) -> Option<&BTreeSet<OrderId>> {
        self.0.get(sku)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sku, &BTreeSet<OrderId>)> + '_ {
        self.0.iter()
    }

    /// All orders known to the index, deduplicated.
    pub fn orders(&self) -> BTreeSet<&OrderId> {
        self.0.values().flatten().collect()
    }
}

/// Result of consolidating one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consolidation {
    demand: BTreeMap<Sku, Quantity>,
    contributions: BTreeMap<Sku, BTreeSet<OrderId>>,
}

impl Consolidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one line item of `order_id` to both the demand and the index.
    pub fn record(&mut self, order_id: &OrderId, item: &LineItem) {
        if item.quantity.is_zero() {
            return;
        }
        let demand = self.demand.entry(item.sku.clone()).or_insert(Quantity::ZERO);
        *demand = demand.saturating_add(item.quantity);

        self.contributions
            .entry(item.sku.clone())
            .or_default()
            .insert(order_id.clone());
    }

    pub fn demand(&self) -> DemandMap {
        DemandMap(self.demand.clone())
    }

    pub fn contributions(&self) -> ContributionIndex {
        ContributionIndex(self.contributions.clone())
    }

    pub fn into_parts(self) -> (DemandMap, ContributionIndex) {
        (DemandMap(self.demand), ContributionIndex(self.contributions))
    }
}

/// Consolidate normalized orders into a [`Consolidation`].
///
/// A pure fold; the result does not depend on the order of `orders`.
pub fn consolidate<'a>(orders: impl IntoIterator<Item = &'a NormalizedOrder>) -> Consolidation {
    orders
        .into_iter()
        .fold(Consolidation::new(), |mut acc, order| {
            for item in &order.items {
                acc.record(&order.id, item);
            }
            acc
        })
}

//! In-memory collaborators.
//!
//! Intended for tests/dev and for the runner's snapshot mode. Not optimized for
//! performance.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use thiserror::Error;

use fulfillsync_core::{Quantity, Sku};
use fulfillsync_fulfillment::{
    DispositionRecord, FulfillmentProvider, FulfillmentRequest, StatusSink, SubmissionReceipt,
};
use fulfillsync_inventory::InventorySystem;
use fulfillsync_sales::Order;

use crate::pipeline::OrderSource;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InMemoryError {
    #[error("injected failure for {0}")]
    Injected(String),

    #[error("lock poisoned")]
    Poisoned,
}

/// Inventory record held in memory, with optional injected read/write failures.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    stock: RwLock<BTreeMap<Sku, Quantity>>,
    failing_reads: HashSet<Sku>,
    failing_writes: HashSet<Sku>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: BTreeMap<Sku, Quantity>) -> Self {
        Self {
            stock: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    pub fn with_stock(self, sku: Sku, quantity: Quantity) -> Self {
        if let Ok(mut stock) = self.stock.write() {
            stock.insert(sku, quantity);
        }
        self
    }

    pub fn fail_reads_for(mut self, sku: Sku) -> Self {
        self.failing_reads.insert(sku);
        self
    }

    pub fn fail_writes_for(mut self, sku: Sku) -> Self {
        self.failing_writes.insert(sku);
        self
    }

    pub fn quantity(&self, sku: &Sku) -> Option<Quantity> {
        self.stock.read().ok()?.get(sku).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<Sku, Quantity> {
        self.stock.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl InventorySystem for InMemoryInventory {
    type Error = InMemoryError;

    fn get_quantity(&self, sku: &Sku) -> Result<Option<Quantity>, Self::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_reads.contains(sku) {
            return Err(InMemoryError::Injected(format!("read of {sku}")));
        }
        let stock = self.stock.read().map_err(|_| InMemoryError::Poisoned)?;
        Ok(stock.get(sku).copied())
    }

    fn set_quantity(&self, sku: &Sku, quantity: Quantity) -> Result<(), Self::Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing_writes.contains(sku) {
            return Err(InMemoryError::Injected(format!("write of {sku}")));
        }
        let mut stock = self.stock.write().map_err(|_| InMemoryError::Poisoned)?;
        stock.insert(sku.clone(), quantity);
        Ok(())
    }
}

/// Fulfillment provider that records requests and accepts or rejects them all.
#[derive(Debug, Default)]
pub struct InMemoryFulfillmentProvider {
    reject_with: Option<String>,
    requests: RwLock<Vec<FulfillmentRequest>>,
}

impl InMemoryFulfillmentProvider {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            reject_with: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<FulfillmentRequest> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl FulfillmentProvider for InMemoryFulfillmentProvider {
    type Error = InMemoryError;

    fn submit(&self, request: &FulfillmentRequest) -> Result<SubmissionReceipt, Self::Error> {
        self.requests
            .write()
            .map_err(|_| InMemoryError::Poisoned)?
            .push(request.clone());

        match &self.reject_with {
            Some(reason) => Err(InMemoryError::Injected(reason.clone())),
            None => Ok(SubmissionReceipt {
                confirmation_id: Some(format!("mem-{}", request.batch_id)),
            }),
        }
    }
}

/// Status sink that keeps every record it receives.
#[derive(Debug, Default)]
pub struct InMemoryStatusSink {
    records: RwLock<Vec<DispositionRecord>>,
}

impl InMemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DispositionRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

impl StatusSink for InMemoryStatusSink {
    type Error = InMemoryError;

    fn propagate(&self, record: &DispositionRecord) -> Result<(), Self::Error> {
        self.records
            .write()
            .map_err(|_| InMemoryError::Poisoned)?
            .push(record.clone());
        Ok(())
    }
}

/// Order source over a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderSource {
    orders: Vec<Order>,
}

impl InMemoryOrderSource {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }
}

impl OrderSource for InMemoryOrderSource {
    type Error = InMemoryError;

    fn fetch(&self) -> Result<Vec<Order>, Self::Error> {
        Ok(self.orders.clone())
    }
}

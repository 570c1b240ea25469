//! Inventory reconciliation.
//!
//! Deducts consolidated demand from an external inventory record, one stock
//! unit at a time, and classifies every unit's outcome. The inventory itself is
//! owned by an external system reached through [`InventorySystem`].

pub mod reconcile;
pub mod system;

pub use reconcile::{
    ReconciliationOutcome, ReconciliationReport, Reconciler, ShortagePolicy,
    UnknownShortagePolicy,
};
pub use system::InventorySystem;

//! Sales-channel orders: ingestion model, normalization and consolidation.
//!
//! This crate contains business rules for turning a snapshot of marketplace
//! orders into one cross-order demand, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod consolidate;
pub mod normalize;
pub mod order;

pub use consolidate::{consolidate, Consolidation, ContributionIndex, DemandMap};
pub use normalize::{normalize, NormalizationStats, NormalizedBatch};
pub use order::{LineItem, NormalizedOrder, Order, OrderStatus, RawLineItem};

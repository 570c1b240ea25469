//! `fulfillsync-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod quantity;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{BatchId, OrderId, Sku};
pub use quantity::Quantity;
pub use value_object::ValueObject;

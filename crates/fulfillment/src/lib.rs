//! Fulfillment: the consolidated request to the fulfillment provider, and the
//! per-order dispositions propagated back to the sales channel.
//!
//! Providers and sinks are reached only through the traits defined here; this
//! crate performs no IO of its own.

pub mod propagate;
pub mod resolve;
pub mod submit;

pub use propagate::{
    propagate_all, DispositionRecord, DispositionStatus, PropagationFailure, PropagationReport,
    StatusSink,
};
pub use resolve::{resolve, BatchSummary, OrderDisposition, Resolution};
pub use submit::{
    FulfillmentProvider, FulfillmentRequest, RequestLine, Submission, SubmissionReceipt, Submitter,
};

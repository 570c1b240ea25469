//! External service adapters.
//!
//! Remote API clients are collaborators behind the domain traits; the adapters
//! here cover local operation (dry runs, snapshot files, line-oriented output).

pub mod dry_run;
pub mod json_lines;

pub use dry_run::DryRunFulfillmentProvider;
pub use json_lines::JsonLinesStatusSink;

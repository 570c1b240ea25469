//! Infrastructure layer: configuration, batch orchestration and collaborator
//! adapters.

pub mod config;
pub mod external;
pub mod in_memory;
pub mod pipeline;

pub use config::{ConfigError, EngineConfig, Marketplace};
pub use pipeline::{BatchOutcome, BatchPipeline, BatchReport, OrderSource, PipelineError};

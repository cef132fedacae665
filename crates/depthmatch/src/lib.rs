#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pipeline configuration.
pub mod config;

/// Error types for the pipeline.
pub mod error;

/// The pair orchestrator.
pub mod orchestrator;

/// Aggregate statistics of a batch.
pub mod report;

pub use crate::config::PipelineConfig;
pub use crate::error::PipelineError;
pub use crate::orchestrator::{
    BatchResult, PairFailure, PairOrchestrator, PairOutcome, SkipReason, SkippedPair,
};
pub use crate::report::ErrorStatistics;

#[doc(inline)]
pub use depthmatch_3d as k3d;

#[doc(inline)]
pub use depthmatch_image as image;

#[doc(inline)]
pub use depthmatch_io as io;

#[doc(inline)]
pub use depthmatch_matching as matching;

#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the io module.
pub mod error;

/// Ground truth pose files and the relative pose output file.
pub mod ground_truth;

/// Loading of color images.
pub mod images;

/// Image pair identifiers.
pub mod pair;

/// Camera and image registration records.
pub mod registration;

/// Correspondence sinks and the record file format.
pub mod sink;

/// Depth and pose prediction sources.
pub mod source;

pub use crate::error::{ImageLoadError, SinkError, SourceError};
pub use crate::ground_truth::GroundTruthError;
pub use crate::images::{DirectoryImages, ImageProvider, MemoryImages};
pub use crate::pair::{pair_id, PairKey};
pub use crate::registration::{ImageRegistration, PriorPose};
pub use crate::sink::{
    read_record_file, CorrespondenceSink, MatchPose, MatchRecord, MemorySink, RecordFileSink,
    SinkRecord,
};
pub use crate::source::{PairPrediction, PredictionArchive, PredictionSource};

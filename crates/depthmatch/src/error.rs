use depthmatch_3d::PoseError;
use depthmatch_io::{GroundTruthError, ImageLoadError, SinkError, SourceError};
use depthmatch_matching::MatchingError;

/// An error type for the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Error reading predictions.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Error writing to the sink.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Error loading an image.
    #[error(transparent)]
    Image(#[from] ImageLoadError),

    /// Error filtering correspondences.
    #[error(transparent)]
    Matching(#[from] MatchingError),

    /// Error computing a pose metric.
    #[error(transparent)]
    Pose(#[from] PoseError),

    /// Error reading ground truth files.
    #[error(transparent)]
    GroundTruth(#[from] GroundTruthError),

    /// Error reading the configuration file.
    #[error("failed to read the configuration file. {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Error parsing the configuration.
    #[error("failed to parse the configuration. {0}")]
    Config(#[from] serde_json::Error),
}

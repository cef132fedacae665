#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera intrinsics.
pub mod camera;

/// Error types for the 3d module.
pub mod error;

/// Pose consistency metrics.
pub mod metrics;

/// Absolute and relative camera poses.
pub mod pose;

/// Rotation representations and conversions.
pub mod rotation;

/// Conversions between row-major arrays and glam types.
pub mod utils;

/// Depth to flow warping.
pub mod warp;

pub use crate::error::PoseError;

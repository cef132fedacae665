use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Parameters of the correspondence pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Focal length of the depth maps in pixels.
    pub focal_length: f64,
    /// Upsampling factor of the registered cameras and keypoints.
    pub image_scale: f64,
    /// Maximum forward-backward distance in pixels, inclusive.
    pub max_reproj_error: f64,
    /// Maximum RGB distance of a correspondence. `None` disables the photometric check.
    pub max_photometric_error: Option<f64>,
    /// Row length used to decode pixel indices in the photometric check.
    /// `None` uses the width of the source depth map.
    pub photometric_cols: Option<usize>,
    /// Pairs whose two rotation angles differ by more than this are skipped.
    pub max_symmetry_error: Option<f64>,
    /// Forward the predicted pose together with the correspondences.
    pub record_pose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            focal_length: 228.13688,
            image_scale: 12.0,
            max_reproj_error: 1.0,
            max_photometric_error: None,
            photometric_cols: None,
            max_symmetry_error: Some(2.5),
            record_pose: true,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}

/// Error types for rotation conversions and pose metrics.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PoseError {
    /// The rotation axis has (close to) zero length.
    #[error("cannot compute rotation matrix from a zero vector")]
    ZeroRotationAxis,

    /// The angle between two translations is undefined when one of them has zero length.
    #[error("cannot compute the angle between translations of norm {0} and {1}")]
    DegenerateTranslation(f64, f64),
}

use crate::error::PoseError;
use crate::pose::RelativePose;
use crate::rotation::{matrix_to_angle_axis, norm, transpose_mul};

/// Angular errors of a pose pair, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseErrorReport {
    /// The rotation angle of the loop rotation.
    pub rotation_error: f64,
    /// The angle between the two translation directions.
    pub translation_error: f64,
}

impl PoseErrorReport {
    /// The same report with both errors in degrees.
    pub fn to_degrees(&self) -> Self {
        Self {
            rotation_error: self.rotation_error.to_degrees(),
            translation_error: self.translation_error.to_degrees(),
        }
    }
}

/// The rotation angle of the loop `R12ᵗ · R21`.
///
/// Returns `‖matrix_to_angle_axis(R12ᵗ · R21)‖`, which is 0 when both matrices are equal.
pub fn rotation_angular_error(r12: &[[f64; 3]; 3], r21: &[[f64; 3]; 3]) -> f64 {
    norm(&matrix_to_angle_axis(&transpose_mul(r12, r21)))
}

fn angle_between(a: &[f64; 3], b: &[f64; 3]) -> Result<f64, PoseError> {
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return Err(PoseError::DegenerateTranslation(na, nb));
    }
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    Ok((dot / (na * nb)).clamp(-1.0, 1.0).acos())
}

/// The angle between `t12` and `−t21`.
///
/// Two consistent predictions point in opposite directions, giving an error of 0.
///
/// # Errors
///
/// Returns [`PoseError::DegenerateTranslation`] when either vector has zero length.
///
/// Example:
///
/// ```
/// use depthmatch_3d::metrics::translation_angular_error;
///
/// let err = translation_angular_error(&[1.0, 2.0, 3.0], &[-2.0, -4.0, -6.0]).unwrap();
/// assert!(err.abs() < 1e-7);
/// ```
pub fn translation_angular_error(t12: &[f64; 3], t21: &[f64; 3]) -> Result<f64, PoseError> {
    angle_between(t12, &[-t21[0], -t21[1], -t21[2]])
}

/// The absolute difference between the rotation angles of `r12` and `r21`.
pub fn rotation_symmetry_error(r12: &[[f64; 3]; 3], r21: &[[f64; 3]; 3]) -> f64 {
    (norm(&matrix_to_angle_axis(r12)) - norm(&matrix_to_angle_axis(r21))).abs()
}

/// Consistency of the two predicted directions of one image pair.
pub fn pairwise_consistency(
    pose12: &RelativePose,
    pose21: &RelativePose,
) -> Result<PoseErrorReport, PoseError> {
    Ok(PoseErrorReport {
        rotation_error: rotation_angular_error(&pose12.rotation, &pose21.rotation),
        translation_error: translation_angular_error(&pose12.translation, &pose21.translation)?,
    })
}

/// Error of an estimated pose against a reference pose of the same direction.
///
/// The rotation error is the angle of `R_refᵗ · R_est` and the translation error the angle
/// between both translations.
pub fn reference_error(
    estimate: &RelativePose,
    reference: &RelativePose,
) -> Result<PoseErrorReport, PoseError> {
    Ok(PoseErrorReport {
        rotation_error: norm(&matrix_to_angle_axis(&transpose_mul(
            &reference.rotation,
            &estimate.rotation,
        ))),
        translation_error: angle_between(&reference.translation, &estimate.translation)?,
    })
}

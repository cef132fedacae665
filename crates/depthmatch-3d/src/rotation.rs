//! Conversions between rotation matrices, Euler angles, quaternions and angle-axis vectors.
//!
//! Conventions used throughout:
//!
//! * Euler angles are applied about the `z`, then `y`, then `x` axes (fixed axes), so the
//!   rotation matrix is `M = Rx · Ry · Rz`.
//! * Matrices are row-major `[[f64; 3]; 3]` and premultiply column vectors.
//! * Quaternions are `[w, x, y, z]` (real part first).
//! * Rotations are counter-clockwise looking from the positive end of the axis (right-handed).

use glam::DMat3;

use crate::error::PoseError;
use crate::utils::{array33_to_dmat3, dmat3_to_array33};

/// Default threshold on `cos(y)` below which [`matrix_to_euler`] takes the gimbal-lock branch.
pub const EULER_CY_THRESHOLD: f64 = 4.0 * f64::EPSILON;

/// Vector norm below which a quaternion is treated as the identity rotation.
const QUATERNION_IDENTITY_THRESHOLD: f64 = 3.0 * f64::EPSILON;

/// Euler angles in radians, applied about z first, then y, then x.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    /// Rotation about the z axis (performed first).
    pub z: f64,
    /// Rotation about the y axis.
    pub y: f64,
    /// Rotation about the x axis (performed last).
    pub x: f64,
}

impl EulerAngles {
    /// Create a new set of Euler angles.
    pub fn new(z: f64, y: f64, x: f64) -> Self {
        Self { z, y, x }
    }
}

/// Recover the z, y, x Euler angles of a rotation matrix.
///
/// When `cos(y)` is close to zero the closed form solution becomes unstable. Below
/// `cy_thresh` (defaults to [`EULER_CY_THRESHOLD`]) the function sets `x = 0` and recovers
/// `z` from the second row of the matrix. In that branch the individual angles are a
/// convention; only the rotation they describe matches the input.
///
/// # Arguments
///
/// * `m` - The rotation matrix.
/// * `cy_thresh` - Optional threshold for the gimbal-lock branch.
///
/// # Returns
///
/// The Euler angles of the rotation.
///
/// Example:
///
/// ```
/// use depthmatch_3d::rotation::{euler_to_matrix, matrix_to_euler, EulerAngles};
///
/// let m = euler_to_matrix(&EulerAngles::new(0.3, -0.2, 0.1));
/// let euler = matrix_to_euler(&m, None);
/// assert!((euler.z - 0.3).abs() < 1e-12);
/// assert!((euler.y + 0.2).abs() < 1e-12);
/// assert!((euler.x - 0.1).abs() < 1e-12);
/// ```
pub fn matrix_to_euler(m: &[[f64; 3]; 3], cy_thresh: Option<f64>) -> EulerAngles {
    let cy_thresh = cy_thresh.unwrap_or(EULER_CY_THRESHOLD);

    // cy: sqrt((cos(y)*cos(x))**2 + (cos(y)*sin(x))**2)
    let cy = (m[2][2] * m[2][2] + m[1][2] * m[1][2]).sqrt();

    if cy > cy_thresh {
        EulerAngles {
            z: (-m[0][1]).atan2(m[0][0]),
            y: m[0][2].atan2(cy),
            x: (-m[1][2]).atan2(m[2][2]),
        }
    } else {
        // cos(y) ~ 0: the second row holds sin(z + x) and cos(z + x)
        EulerAngles {
            z: m[1][0].atan2(m[1][1]),
            y: m[0][2].atan2(cy),
            x: 0.0,
        }
    }
}

/// Compute the rotation matrix of a set of Euler angles, `M = Rx · Ry · Rz`.
pub fn euler_to_matrix(euler: &EulerAngles) -> [[f64; 3]; 3] {
    let m = DMat3::from_rotation_x(euler.x)
        * DMat3::from_rotation_y(euler.y)
        * DMat3::from_rotation_z(euler.z);
    dmat3_to_array33(&m)
}

/// Compute the quaternion `[w, x, y, z]` of a set of Euler angles.
///
/// The quaternion is the Hamilton product of the half-angle rotations `qx · qy · qz`.
pub fn euler_to_quaternion(euler: &EulerAngles) -> [f64; 4] {
    let (sz, cz) = (euler.z / 2.0).sin_cos();
    let (sy, cy) = (euler.y / 2.0).sin_cos();
    let (sx, cx) = (euler.x / 2.0).sin_cos();

    [
        cx * cy * cz - sx * sy * sz,
        cx * sy * sz + cy * cz * sx,
        cx * cz * sy - sx * cy * sz,
        cx * cy * sz + sx * cz * sy,
    ]
}

/// Compute the angle and unit axis of a quaternion `[w, x, y, z]`.
///
/// The angle is `2 * acos(w)` and therefore non-negative. A quaternion whose vector part is
/// (numerically) zero is the identity and returns angle `0` with the arbitrary axis `[1, 0, 0]`.
pub fn quaternion_to_angle_axis(q: &[f64; 4]) -> (f64, [f64; 3]) {
    let [w, x, y, z] = *q;
    let n = (x * x + y * y + z * z).sqrt();

    if n < QUATERNION_IDENTITY_THRESHOLD {
        return (0.0, [1.0, 0.0, 0.0]);
    }

    (2.0 * w.clamp(-1.0, 1.0).acos(), [x / n, y / n, z / n])
}

/// Compute the angle and unit axis of a set of Euler angles.
///
/// The axis is unstable for near-zero rotations; see [`quaternion_to_angle_axis`].
pub fn euler_to_angle_axis(euler: &EulerAngles) -> (f64, [f64; 3]) {
    quaternion_to_angle_axis(&euler_to_quaternion(euler))
}

/// Compute the rotation matrix of a quaternion `[w, x, y, z]`.
///
/// Every term is scaled by the inverse square length of the quaternion, so unnormalized
/// input is tolerated.
///
/// Example:
///
/// ```
/// use depthmatch_3d::rotation::quaternion_to_matrix;
///
/// // 90 degrees about z, unnormalized
/// let s = std::f64::consts::FRAC_1_SQRT_2;
/// let m = quaternion_to_matrix(&[2.0 * s, 0.0, 0.0, 2.0 * s]);
/// assert!((m[0][1] + 1.0).abs() < 1e-12);
/// assert!((m[1][0] - 1.0).abs() < 1e-12);
/// ```
pub fn quaternion_to_matrix(q: &[f64; 4]) -> [[f64; 3]; 3] {
    let [qw, qx, qy, qz] = *q;
    let sqw = qw * qw;
    let sqx = qx * qx;
    let sqy = qy * qy;
    let sqz = qz * qz;

    // inverse square length, only needed if the quaternion is not normalized
    let invs = 1.0 / (sqx + sqy + sqz + sqw);

    let m00 = (sqx - sqy - sqz + sqw) * invs;
    let m11 = (-sqx + sqy - sqz + sqw) * invs;
    let m22 = (-sqx - sqy + sqz + sqw) * invs;

    let tmp1 = qx * qy;
    let tmp2 = qz * qw;
    let m10 = 2.0 * (tmp1 + tmp2) * invs;
    let m01 = 2.0 * (tmp1 - tmp2) * invs;

    let tmp3 = qx * qz;
    let tmp4 = qy * qw;
    let m20 = 2.0 * (tmp3 - tmp4) * invs;
    let m02 = 2.0 * (tmp3 + tmp4) * invs;

    let tmp5 = qy * qz;
    let tmp6 = qx * qw;
    let m21 = 2.0 * (tmp5 + tmp6) * invs;
    let m12 = 2.0 * (tmp5 - tmp6) * invs;

    [[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]]
}

/// Compute the angle-axis vector (axis scaled by the angle) of a rotation matrix.
///
/// The conversion goes through [`matrix_to_euler`] and [`euler_to_angle_axis`]. Since the
/// angle is multiplied into the vector, a near-identity rotation yields a near-zero vector
/// whatever the axis is.
///
/// Example:
///
/// ```
/// use depthmatch_3d::rotation::matrix_to_angle_axis;
///
/// let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// assert_eq!(matrix_to_angle_axis(&identity), [0.0, 0.0, 0.0]);
/// ```
pub fn matrix_to_angle_axis(m: &[[f64; 3]; 3]) -> [f64; 3] {
    let (angle, axis) = euler_to_angle_axis(&matrix_to_euler(m, None));
    [axis[0] * angle, axis[1] * angle, axis[2] * angle]
}

/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation, normalized internally.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix, or an error if the axis has zero length.
///
/// Example:
///
/// ```
/// use depthmatch_3d::rotation::angle_axis_to_matrix;
///
/// let axis = [1.0, 0.0, 0.0];
/// let angle = std::f64::consts::PI / 2.0;
/// let rotation = angle_axis_to_matrix(&axis, angle).unwrap();
/// assert!((rotation[1][2] + 1.0).abs() < 1e-12);
/// ```
pub fn angle_axis_to_matrix(axis: &[f64; 3], angle: f64) -> Result<[[f64; 3]; 3], PoseError> {
    let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
    if magnitude < 1e-10 {
        return Err(PoseError::ZeroRotationAxis);
    }

    let x = axis[0] / magnitude;
    let y = axis[1] / magnitude;
    let z = axis[2] / magnitude;

    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;

    let m00 = c + x * x * t;
    let m11 = c + y * y * t;
    let m22 = c + z * z * t;

    let tmp1 = x * y * t;
    let tmp2 = z * s;
    let m10 = tmp1 + tmp2;
    let m01 = tmp1 - tmp2;

    let tmp3 = x * z * t;
    let tmp4 = y * s;
    let m20 = tmp3 - tmp4;
    let m02 = tmp3 + tmp4;

    let tmp5 = y * z * t;
    let tmp6 = x * s;
    let m12 = tmp5 - tmp6;
    let m21 = tmp5 + tmp6;

    Ok([[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]])
}

/// Compute the rotation matrix of an angle-axis vector (axis scaled by the angle).
///
/// A zero vector is the identity rotation.
pub fn rotation_vector_to_matrix(v: &[f64; 3]) -> [[f64; 3]; 3] {
    let angle = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    match angle_axis_to_matrix(v, angle) {
        Ok(m) => m,
        Err(_) => [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    }
}

/// Compute `aᵗ · b` for two rotation matrices.
pub fn transpose_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    dmat3_to_array33(&(array33_to_dmat3(a).transpose() * array33_to_dmat3(b)))
}

/// Euclidean norm of a 3-vector.
pub fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_matrix_eq(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], epsilon: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(a[i][j], b[i][j], epsilon = epsilon);
            }
        }
    }

    #[test]
    fn test_euler_to_matrix_single_axis() {
        let z = euler_to_matrix(&EulerAngles::new(FRAC_PI_2, 0.0, 0.0));
        assert_matrix_eq(
            &z,
            &[[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            1e-12,
        );
        let y = euler_to_matrix(&EulerAngles::new(0.0, FRAC_PI_2, 0.0));
        assert_matrix_eq(
            &y,
            &[[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]],
            1e-12,
        );
        let x = euler_to_matrix(&EulerAngles::new(0.0, 0.0, FRAC_PI_2));
        assert_matrix_eq(
            &x,
            &[[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]],
            1e-12,
        );
    }

    #[test]
    fn test_matrix_to_euler_standard_branch() {
        let euler = EulerAngles::new(1.3, -0.1, 0.2);
        let recovered = matrix_to_euler(&euler_to_matrix(&euler), None);
        assert_relative_eq!(recovered.z, 1.3, epsilon = 1e-12);
        assert_relative_eq!(recovered.y, -0.1, epsilon = 1e-12);
        assert_relative_eq!(recovered.x, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_to_euler_gimbal_lock() {
        let m = euler_to_matrix(&EulerAngles::new(0.3, FRAC_PI_2, 0.2));
        let recovered = matrix_to_euler(&m, None);
        // x is pinned to zero and z absorbs the x rotation
        assert_eq!(recovered.x, 0.0);
        assert_relative_eq!(recovered.y, FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(recovered.z, 0.5, epsilon = 1e-12);
        assert_matrix_eq(&euler_to_matrix(&recovered), &m, 1e-12);
    }

    #[test]
    fn test_matrix_to_euler_custom_threshold() {
        // a huge threshold forces the degenerate branch
        let m = euler_to_matrix(&EulerAngles::new(0.4, 0.0, 0.0));
        let recovered = matrix_to_euler(&m, Some(2.0));
        assert_eq!(recovered.x, 0.0);
        assert_relative_eq!(recovered.z, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_to_quaternion_matches_matrix() {
        let euler = EulerAngles::new(0.7, -0.4, 1.1);
        let from_quat = quaternion_to_matrix(&euler_to_quaternion(&euler));
        assert_matrix_eq(&from_quat, &euler_to_matrix(&euler), 1e-12);
    }

    #[test]
    fn test_euler_to_angle_axis_single_axis() {
        let (angle, axis) = euler_to_angle_axis(&EulerAngles::new(0.0, 1.5, 0.0));
        assert_relative_eq!(angle, 1.5, epsilon = 1e-12);
        assert_relative_eq!(axis[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(axis[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(axis[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quaternion_to_angle_axis_identity() {
        let (angle, axis) = quaternion_to_angle_axis(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(angle, 0.0);
        assert_eq!(axis, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_quaternion_to_matrix_unnormalized() {
        let q = [0.9, 0.1, -0.3, 0.2];
        let scaled = [1.8, 0.2, -0.6, 0.4];
        assert_matrix_eq(&quaternion_to_matrix(&q), &quaternion_to_matrix(&scaled), 1e-12);
    }

    #[test]
    fn test_quaternion_to_matrix_reference_pose() {
        // relative pose from a COLMAP reconstruction and its reported rotation matrix
        let q = [0.999864, 0.00444097, 0.00296566, -0.0155996];
        let expected = [
            [0.999496, 0.0312212, 0.00579196],
            [-0.0311686, 0.999474, -0.00897326],
            [-0.00606907, 0.00878821, 0.999943],
        ];
        assert_matrix_eq(&quaternion_to_matrix(&q), &expected, 1e-4);
    }

    #[test]
    fn test_transpose_mul_inverse() {
        let m = euler_to_matrix(&EulerAngles::new(0.2, 0.5, -0.9));
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_matrix_eq(&transpose_mul(&m, &m), &identity, 1e-12);
    }

    #[test]
    fn test_matrix_to_angle_axis_identity() {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(norm(&matrix_to_angle_axis(&identity)), 0.0);
    }

    #[test]
    fn test_matrix_to_angle_axis_about_z() {
        let m = euler_to_matrix(&EulerAngles::new(0.25, 0.0, 0.0));
        let v = matrix_to_angle_axis(&m);
        assert_relative_eq!(v[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(v[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(v[2], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_axis_to_matrix() -> Result<(), Box<dyn std::error::Error>> {
        let rotation = angle_axis_to_matrix(&[1.0, 0.0, 0.0], PI / 2.0)?;
        let expected = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
        assert_matrix_eq(&rotation, &expected, 1e-12);
        Ok(())
    }

    #[test]
    fn test_angle_axis_to_matrix_zero_axis() {
        assert_eq!(
            angle_axis_to_matrix(&[0.0, 0.0, 0.0], 1.0),
            Err(PoseError::ZeroRotationAxis)
        );
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(rotation_vector_to_matrix(&[0.0, 0.0, 0.0]), identity);
    }
}

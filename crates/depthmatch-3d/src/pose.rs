use crate::rotation::{matrix_to_angle_axis, quaternion_to_matrix};
use crate::utils::{array33_to_dmat3, array3_to_dvec3, dmat3_to_array33};

/// Absolute pose of a camera, mapping world coordinates to camera coordinates.
///
/// A world point `x` is expressed in the camera frame as `rotation · x + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// World to camera rotation matrix (row-major).
    pub rotation: [[f64; 3]; 3],
    /// World to camera translation.
    pub translation: [f64; 3],
}

impl CameraPose {
    /// Create a camera pose from a quaternion `[w, x, y, z]` and a translation.
    pub fn from_quaternion(quaternion: &[f64; 4], translation: [f64; 3]) -> Self {
        Self {
            rotation: quaternion_to_matrix(quaternion),
            translation,
        }
    }
}

/// Relative pose transforming points from the frame of camera A to the frame of camera B.
///
/// A point `p` in A's frame is `rotation · p + translation` in B's frame. Direction
/// matters: the pose B→A is [`RelativePose::inverse`] of the pose A→B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePose {
    /// Rotation matrix from A to B (row-major).
    pub rotation: [[f64; 3]; 3],
    /// Translation from A to B.
    pub translation: [f64; 3],
}

impl RelativePose {
    /// The identity pose.
    pub const IDENTITY: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0, 0.0, 0.0],
    };

    /// Create a new relative pose.
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Compose the relative pose A→B from the absolute poses of both cameras.
    ///
    /// `R_ab = R_b · R_aᵗ` and `t_ab = t_b − R_ab · t_a`.
    ///
    /// Example:
    ///
    /// ```
    /// use depthmatch_3d::pose::{CameraPose, RelativePose};
    ///
    /// let a = CameraPose::from_quaternion(&[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
    /// let b = CameraPose::from_quaternion(&[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 1.0]);
    /// let pose = RelativePose::from_absolute(&a, &b);
    /// assert_eq!(pose.translation, [1.0, 0.0, 0.0]);
    /// ```
    pub fn from_absolute(a: &CameraPose, b: &CameraPose) -> Self {
        let r_a = array33_to_dmat3(&a.rotation);
        let r_b = array33_to_dmat3(&b.rotation);
        let r_ab = r_b * r_a.transpose();
        let t_ab = array3_to_dvec3(&b.translation) - r_ab * array3_to_dvec3(&a.translation);
        Self {
            rotation: dmat3_to_array33(&r_ab),
            translation: t_ab.to_array(),
        }
    }

    /// The pose in the opposite direction, `(Rᵗ, −Rᵗ · t)`.
    pub fn inverse(&self) -> Self {
        let r_t = array33_to_dmat3(&self.rotation).transpose();
        let t = -(r_t * array3_to_dvec3(&self.translation));
        Self {
            rotation: dmat3_to_array33(&r_t),
            translation: t.to_array(),
        }
    }

    /// Transform a point from A's frame into B's frame.
    pub fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = array33_to_dmat3(&self.rotation) * array3_to_dvec3(point)
            + array3_to_dvec3(&self.translation);
        p.to_array()
    }

    /// The rotation as an angle-axis vector.
    pub fn rotation_vector(&self) -> [f64; 3] {
        matrix_to_angle_axis(&self.rotation)
    }
}

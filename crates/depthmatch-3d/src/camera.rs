use depthmatch_image::ImageSize;

/// Represents the intrinsic parameters of a pinhole camera without skew or distortion.
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeIntrinsics {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl PinholeIntrinsics {
    /// Intrinsics with one shared focal length and the principal point at the image center.
    ///
    /// Example:
    ///
    /// ```
    /// use depthmatch_3d::camera::PinholeIntrinsics;
    /// use depthmatch_image::ImageSize;
    ///
    /// let k = PinholeIntrinsics::from_focal_length(2.0, ImageSize { width: 5, height: 4 });
    /// assert_eq!((k.cx, k.cy), (2.5, 2.0));
    /// ```
    pub fn from_focal_length(focal_length: f64, size: ImageSize) -> Self {
        Self {
            fx: focal_length,
            fy: focal_length,
            cx: size.width as f64 / 2.0,
            cy: size.height as f64 / 2.0,
        }
    }

    /// The camera matrix `K` as a row-major 3x3 array.
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Back-project a pixel to the ray `K⁻¹ · [x, y, 1]` whose z component is 1.
    ///
    /// PRECONDITION: the focal lengths are non-zero.
    pub fn unproject(&self, x: f64, y: f64) -> [f64; 3] {
        [(x - self.cx) / self.fx, (y - self.cy) / self.fy, 1.0]
    }

    /// Project a camera-frame point with `K · p` followed by the perspective division.
    ///
    /// Points on the `z = 0` plane map to non-finite coordinates.
    pub fn project(&self, point: &[f64; 3]) -> [f64; 2] {
        let [x, y, z] = *point;
        [
            (self.fx * x + self.cx * z) / z,
            (self.fy * y + self.cy * z) / z,
        ]
    }
}

use depthmatch_image::ImageSize;

use crate::ground_truth::GroundTruthImage;

/// Camera model id of a simple radial camera `[f, cx, cy, k]`.
pub const SIMPLE_RADIAL_CAMERA_MODEL: u32 = 2;

/// Intrinsics registered for one image.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct CameraRecord {
    /// The camera model id.
    pub model_id: u32,
    /// The width of the camera in pixels.
    pub width: u32,
    /// The height of the camera in pixels.
    pub height: u32,
    /// The model parameters `[f, cx, cy, k]`.
    pub params: [f64; 4],
}

/// Known absolute pose of a registered image.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct PriorPose {
    /// World to camera rotation `[w, x, y, z]`.
    pub quaternion: [f64; 4],
    /// World to camera translation.
    pub translation: [f64; 3],
    /// World to camera rotation as an angle-axis vector.
    pub angle_axis: [f64; 3],
}

impl From<&GroundTruthImage> for PriorPose {
    fn from(image: &GroundTruthImage) -> Self {
        Self {
            quaternion: image.quaternion,
            translation: image.translation,
            angle_axis: image.angle_axis,
        }
    }
}

/// Everything a sink stores about one image.
///
/// The camera and the keypoints live in a pixel grid upsampled by `scale`: every pixel
/// `(col, row)` of the depth map becomes the keypoint `(scale·(col + 0.5), scale·(row + 0.5))`,
/// so a flattened pixel index is also a keypoint index.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct ImageRegistration {
    /// The file name of the image.
    pub name: String,
    /// The scaled camera.
    pub camera: CameraRecord,
    /// The known pose of the image, if any.
    pub prior: Option<PriorPose>,
    /// Keypoints `[x, y, scale, orientation]` in raster order.
    pub keypoints: Vec<[f32; 4]>,
}

impl ImageRegistration {
    /// Build the registration of an image whose depth map has `size` pixels.
    ///
    /// # Arguments
    ///
    /// * `name` - The file name of the image.
    /// * `size` - The size of the depth map.
    /// * `focal_length` - The focal length of the depth map in pixels.
    /// * `scale` - The upsampling factor.
    ///
    /// Example:
    ///
    /// ```
    /// use depthmatch_image::ImageSize;
    /// use depthmatch_io::registration::ImageRegistration;
    ///
    /// let reg = ImageRegistration::new("a.jpg", ImageSize { width: 4, height: 2 }, 2.0, 10.0);
    /// assert_eq!((reg.camera.width, reg.camera.height), (40, 20));
    /// assert_eq!(reg.camera.params, [20.0, 20.0, 10.0, 0.0]);
    /// assert_eq!(reg.keypoints[5], [15.0, 15.0, 0.0, 0.0]);
    /// ```
    pub fn new(name: impl Into<String>, size: ImageSize, focal_length: f64, scale: f64) -> Self {
        let (width, height) = (size.width as f64, size.height as f64);
        let camera = CameraRecord {
            model_id: SIMPLE_RADIAL_CAMERA_MODEL,
            width: (scale * width) as u32,
            height: (scale * height) as u32,
            params: [
                scale * focal_length,
                scale * width / 2.0,
                scale * height / 2.0,
                0.0,
            ],
        };

        let s = scale as f32;
        let keypoints = (0..size.height)
            .flat_map(|row| {
                (0..size.width).map(move |col| {
                    [s * (0.5 + col as f32), s * (0.5 + row as f32), 0.0, 0.0]
                })
            })
            .collect();

        Self {
            name: name.into(),
            camera,
            prior: None,
            keypoints,
        }
    }

    /// Attach a known pose.
    pub fn with_prior(mut self, prior: PriorPose) -> Self {
        self.prior = Some(prior);
        self
    }
}

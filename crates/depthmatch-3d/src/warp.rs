use depthmatch_image::{Image, ImageSize};
use rayon::prelude::*;

use crate::camera::PinholeIntrinsics;
use crate::pose::RelativePose;
use crate::utils::{array33_to_dmat3, array3_to_dvec3};

/// Per-pixel depth of a source image, stored as the inverse of the z coordinate.
///
/// PRECONDITION: every value is finite and non-zero.
pub type DepthMap = Image<f32, 1>;

/// Dense displacement field from a source image to a destination image.
///
/// Channel 0 holds the x displacement divided by the field width and channel 1 the y
/// displacement divided by the field height.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField(pub Image<f64, 2>);

impl FlowField {
    /// The size of the field, equal to the size of the depth map it was computed from.
    pub fn size(&self) -> ImageSize {
        self.0.size()
    }

    /// The normalized displacement at `(x, y)`, or `None` when out of bounds.
    pub fn displacement(&self, x: usize, y: usize) -> Option<[f64; 2]> {
        self.0.pixel(x, y).map(|px| [px[0], px[1]])
    }

    /// The displacement at `(x, y)` in pixels.
    pub fn pixel_displacement(&self, x: usize, y: usize) -> Option<[f64; 2]> {
        let size = self.size();
        self.displacement(x, y)
            .map(|[fx, fy]| [fx * size.width as f64, fy * size.height as f64])
    }

    /// The underlying two channel image.
    pub fn as_image(&self) -> &Image<f64, 2> {
        &self.0
    }
}

/// Warp every pixel of a depth map into a second view and return the resulting flow.
///
/// Each pixel `(x, y)` is back-projected with `K⁻¹` and scaled by `1 / depth` into a 3D
/// point of the source camera, moved with `R · p + t`, projected with `K` and divided by
/// its z coordinate. `K` uses `focal_length` for both axes and the map center as principal
/// point.
///
/// PRECONDITION: depth values are finite and non-zero; otherwise the flow at that pixel is
/// non-finite.
///
/// # Arguments
///
/// * `depth` - The depth map of the source image.
/// * `pose` - The relative pose from the source to the destination camera.
/// * `focal_length` - The focal length in pixels.
///
/// # Returns
///
/// The normalized flow field with the same size as `depth`.
///
/// Example:
///
/// ```
/// use depthmatch_3d::pose::RelativePose;
/// use depthmatch_3d::warp::{flow_from_depth, DepthMap};
/// use depthmatch_image::ImageSize;
///
/// let depth = DepthMap::from_size_val(ImageSize { width: 4, height: 4 }, 10.0);
/// let flow = flow_from_depth(&depth, &RelativePose::IDENTITY, 2.0);
/// assert!(flow.as_image().as_slice().iter().all(|v| v.abs() < 1e-12));
/// ```
pub fn flow_from_depth(depth: &DepthMap, pose: &RelativePose, focal_length: f64) -> FlowField {
    let size = depth.size();
    let mut flow = Image::<f64, 2>::from_size_val(size, 0.0);
    if size.num_pixels() == 0 {
        return FlowField(flow);
    }

    let intrinsics = PinholeIntrinsics::from_focal_length(focal_length, size);
    let rotation = array33_to_dmat3(&pose.rotation);
    let translation = array3_to_dvec3(&pose.translation);
    let (width, height) = (size.width as f64, size.height as f64);

    flow.as_slice_mut()
        .par_chunks_exact_mut(size.width * 2)
        .zip(depth.as_slice().par_chunks_exact(size.width))
        .enumerate()
        .for_each(|(y, (flow_row, depth_row))| {
            let yf = y as f64;
            for (x, (flow_px, &d)) in flow_row
                .chunks_exact_mut(2)
                .zip(depth_row.iter())
                .enumerate()
            {
                let xf = x as f64;
                let z = 1.0 / d as f64;
                let ray = array3_to_dvec3(&intrinsics.unproject(xf, yf));
                let point = rotation * (ray * z) + translation;
                let [u, v] = intrinsics.project(&point.to_array());
                flow_px[0] = (u - xf) / width;
                flow_px[1] = (v - yf) / height;
            }
        });

    FlowField(flow)
}

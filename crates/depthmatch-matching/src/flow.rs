use depthmatch_3d::warp::FlowField;

/// A pixel correspondence between two images.
///
/// Both ends are flattened raster indices `row * width + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Correspondence {
    /// Index of the pixel in the source image.
    pub source: u32,
    /// Index of the pixel in the target image.
    pub target: u32,
}

impl Correspondence {
    /// Create a new correspondence.
    pub fn new(source: u32, target: u32) -> Self {
        Self { source, target }
    }
}

/// An ordered list of correspondences.
pub type CorrespondenceSet = Vec<Correspondence>;

/// Correspondences extracted from a flow field together with their pixel coordinates.
///
/// The three vectors are parallel: entry `i` of `source_coords` and `target_coords` holds
/// the `(x, y)` coordinates of `matches[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowMatches {
    /// The correspondences in raster order of their source pixel.
    pub matches: CorrespondenceSet,
    /// Source pixel coordinates `(x, y)`.
    pub source_coords: Vec<[u32; 2]>,
    /// Target pixel coordinates `(x, y)`, snapped to the nearest pixel.
    pub target_coords: Vec<[u32; 2]>,
}

impl FlowMatches {
    /// The number of correspondences.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether there are no correspondences.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    fn push(&mut self, width: usize, source: [usize; 2], target: [usize; 2]) {
        self.matches.push(Correspondence::new(
            (source[1] * width + source[0]) as u32,
            (target[1] * width + target[0]) as u32,
        ));
        self.source_coords.push([source[0] as u32, source[1] as u32]);
        self.target_coords.push([target[0] as u32, target[1] as u32]);
    }
}

// Moves `origin` by the displacement rounded to whole pixels (ties to even).
// None when the displacement is not finite or the target falls outside `[0, len)`.
fn snap(origin: usize, displacement: f64, len: usize) -> Option<usize> {
    let step = displacement.round_ties_even();
    if !step.is_finite() {
        return None;
    }
    let target = origin as f64 + step;
    if target >= 0.0 && target < len as f64 {
        Some(target as usize)
    } else {
        None
    }
}

/// Turn a normalized flow field into pixel correspondences.
///
/// The displacement of every pixel is scaled back to pixels, rounded to a whole number of
/// pixels (halves round to even) and added to the pixel position. Destinations outside the image, and
/// non-finite displacements, produce no correspondence.
///
/// # Arguments
///
/// * `flow` - The flow field, normalized by its width and height.
///
/// # Returns
///
/// The correspondences in raster order of the source pixel.
///
/// Example:
///
/// ```
/// use depthmatch_3d::warp::FlowField;
/// use depthmatch_image::{Image, ImageSize};
/// use depthmatch_matching::flow::flow_to_matches;
///
/// let size = ImageSize { width: 3, height: 2 };
/// let flow = FlowField(Image::from_size_val(size, 0.0));
/// let matches = flow_to_matches(&flow);
/// assert_eq!(matches.len(), 6);
/// assert!(matches.matches.iter().all(|m| m.source == m.target));
/// ```
pub fn flow_to_matches(flow: &FlowField) -> FlowMatches {
    let size = flow.size();
    let (width, height) = (size.width as f64, size.height as f64);

    let mut matches = FlowMatches::default();
    if size.num_pixels() == 0 {
        return matches;
    }

    for (i, displacement) in flow.as_image().as_slice().chunks_exact(2).enumerate() {
        let (x, y) = (i % size.width, i / size.width);
        let target_x = snap(x, displacement[0] * width, size.width);
        let target_y = snap(y, displacement[1] * height, size.height);
        if let (Some(tx), Some(ty)) = (target_x, target_y) {
            matches.push(size.width, [x, y], [tx, ty]);
        }
    }

    matches
}

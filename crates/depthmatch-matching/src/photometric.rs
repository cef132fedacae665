use depthmatch_image::Image;

use crate::error::MatchingError;
use crate::flow::{Correspondence, CorrespondenceSet};

/// Decode a flattened pixel index into `(x, y)` for rows of `cols` pixels.
pub fn index_to_coords(index: u32, cols: usize) -> Result<(usize, usize), MatchingError> {
    if cols == 0 {
        return Err(MatchingError::ZeroColumns);
    }
    let index = index as usize;
    Ok((index % cols, index / cols))
}

fn rgb_at(image: &Image<u8, 3>, index: u32, cols: usize) -> Result<[u8; 3], MatchingError> {
    let (x, y) = index_to_coords(index, cols)?;
    match image.pixel(x, y) {
        Some(px) => Ok([px[0], px[1], px[2]]),
        None => Err(MatchingError::PixelOutOfBounds(
            index,
            x,
            y,
            image.width(),
            image.height(),
        )),
    }
}

/// Keep the correspondences whose two pixels have similar colors.
///
/// The squared euclidean distance between the RGB values of both pixels is compared with
/// `max_error²`; the comparison is inclusive.
///
/// # Arguments
///
/// * `matches` - Correspondences from `image_a` to `image_b`.
/// * `max_error` - The maximum RGB distance.
/// * `image_a` - The source image.
/// * `image_b` - The target image.
/// * `cols` - The row length used to build the flattened indices.
///
/// # Errors
///
/// Fails when `cols` is zero or when an index decodes outside of either image.
///
/// Example:
///
/// ```
/// use depthmatch_image::{Image, ImageSize};
/// use depthmatch_matching::flow::Correspondence;
/// use depthmatch_matching::photometric::photometric_check;
///
/// let size = ImageSize { width: 2, height: 1 };
/// let a = Image::<u8, 3>::new(size, vec![10, 10, 10, 200, 0, 0]).unwrap();
/// let b = Image::<u8, 3>::new(size, vec![10, 10, 11, 0, 0, 0]).unwrap();
/// let matches = vec![Correspondence::new(0, 0), Correspondence::new(1, 1)];
/// let kept = photometric_check(&matches, 1.0, &a, &b, 2).unwrap();
/// assert_eq!(kept, vec![Correspondence::new(0, 0)]);
/// ```
pub fn photometric_check(
    matches: &[Correspondence],
    max_error: f64,
    image_a: &Image<u8, 3>,
    image_b: &Image<u8, 3>,
    cols: usize,
) -> Result<CorrespondenceSet, MatchingError> {
    if matches.is_empty() {
        return Ok(vec![]);
    }

    let max_sq = max_error * max_error;
    let mut kept = Vec::with_capacity(matches.len());
    for m in matches {
        let a = rgb_at(image_a, m.source, cols)?;
        let b = rgb_at(image_b, m.target, cols)?;
        let dist_sq: i32 = a
            .iter()
            .zip(b.iter())
            .map(|(&ca, &cb)| (ca as i32 - cb as i32).pow(2))
            .sum();
        if dist_sq as f64 <= max_sq {
            kept.push(*m);
        }
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthmatch_image::ImageSize;

    fn gray(width: usize, height: usize, values: &[u8]) -> Image<u8, 3> {
        Image::from_fn(ImageSize { width, height }, |x, y| {
            let v = values[y * width + x];
            [v, v, v]
        })
    }

    #[test]
    fn test_threshold_is_inclusive() -> Result<(), MatchingError> {
        let a = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: 1,
                height: 1,
            },
            0,
        );
        let b = Image::<u8, 3>::new(
            ImageSize {
                width: 1,
                height: 1,
            },
            vec![3, 4, 0],
        )
        .unwrap();
        let matches = vec![Correspondence::new(0, 0)];

        assert_eq!(photometric_check(&matches, 5.0, &a, &b, 1)?, matches);
        assert!(photometric_check(&matches, 4.999, &a, &b, 1)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_decodes_with_given_columns() -> Result<(), MatchingError> {
        let a = gray(3, 2, &[0, 1, 2, 3, 4, 5]);
        let b = gray(3, 2, &[5, 4, 3, 2, 1, 0]);
        // index 4 is (1, 1) and index 1 is (1, 0)
        let matches = vec![
            Correspondence::new(4, 1),
            Correspondence::new(1, 1),
            Correspondence::new(0, 5),
        ];
        let kept = photometric_check(&matches, 0.5, &a, &b, 3)?;
        assert_eq!(
            kept,
            vec![Correspondence::new(4, 1), Correspondence::new(0, 5)]
        );

        assert_eq!(index_to_coords(4, 3)?, (1, 1));
        Ok(())
    }

    #[test]
    fn test_out_of_range_index() {
        let a = gray(2, 2, &[0; 4]);
        let matches = vec![Correspondence::new(4, 0)];
        assert_eq!(
            photometric_check(&matches, 1.0, &a, &a, 2),
            Err(MatchingError::PixelOutOfBounds(4, 0, 2, 2, 2))
        );
        assert_eq!(
            photometric_check(&matches, 1.0, &a, &a, 0),
            Err(MatchingError::ZeroColumns)
        );
    }

    #[test]
    fn test_empty_matches() -> Result<(), MatchingError> {
        let a = gray(1, 1, &[0]);
        assert!(photometric_check(&[], 1.0, &a, &a, 0)?.is_empty());
        Ok(())
    }
}

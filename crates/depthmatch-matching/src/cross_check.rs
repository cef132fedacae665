use std::collections::HashMap;

use crate::flow::{Correspondence, CorrespondenceSet, FlowMatches};

// Forward matches landing on one target pixel: how many, and the source of the first.
struct TargetBucket {
    count: usize,
    source: [u32; 2],
}

/// Keep the correspondences that agree in both matching directions.
///
/// `forward` maps pixels of image A to image B and `backward` maps pixels of image B to
/// image A. A backward match `b → a` is kept when exactly one forward match lands on `b`
/// and its source pixel lies within `max_reproj_error` of `a`. Target pixels reached by
/// several forward matches are ambiguous and reject every backward match starting there.
///
/// # Arguments
///
/// * `forward` - The matches from A to B.
/// * `backward` - The matches from B to A.
/// * `max_reproj_error` - The maximum distance in pixels, inclusive.
///
/// # Returns
///
/// The accepted correspondences as `(pixel in A, pixel in B)`, in the order of `backward`.
/// Empty when either input is empty.
pub fn cross_check_matches(
    forward: &FlowMatches,
    backward: &FlowMatches,
    max_reproj_error: f64,
) -> CorrespondenceSet {
    if forward.is_empty() || backward.is_empty() {
        return vec![];
    }

    let mut buckets: HashMap<u32, TargetBucket> = HashMap::with_capacity(forward.len());
    for (m, source) in forward.matches.iter().zip(forward.source_coords.iter()) {
        buckets
            .entry(m.target)
            .and_modify(|bucket| bucket.count += 1)
            .or_insert(TargetBucket {
                count: 1,
                source: *source,
            });
    }

    let max_sq = max_reproj_error * max_reproj_error;
    let mut ambiguous = 0;
    let mut accepted = Vec::new();

    for (m, target) in backward.matches.iter().zip(backward.target_coords.iter()) {
        let Some(bucket) = buckets.get(&m.source) else {
            continue;
        };
        if bucket.count > 1 {
            ambiguous += 1;
            continue;
        }

        let dx = bucket.source[0] as f64 - target[0] as f64;
        let dy = bucket.source[1] as f64 - target[1] as f64;
        if dx * dx + dy * dy <= max_sq {
            accepted.push(Correspondence::new(m.target, m.source));
        }
    }

    log::debug!(
        "cross check kept {} of {} backward matches ({} ambiguous)",
        accepted.len(),
        backward.len(),
        ambiguous
    );

    accepted
}

use std::fmt;

use crate::error::SourceError;

/// Separator between the two image names of a pair key.
pub const PAIR_KEY_SEPARATOR: &str = "---";

/// Multiplier folding two image ids into one pair id.
pub const MAX_IMAGE_ID: u64 = 2147483647;

/// A directional image pair identifier, written `imageA---imageB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    /// The name of the source image.
    pub first: String,
    /// The name of the target image.
    pub second: String,
}

impl PairKey {
    /// Create a new pair key from two image names.
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Parse a key of the form `imageA---imageB`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MalformedPairKey`] when the separator is missing or either name
    /// is empty.
    ///
    /// Example:
    ///
    /// ```
    /// use depthmatch_io::pair::PairKey;
    ///
    /// let key = PairKey::parse("a.jpg---b.jpg").unwrap();
    /// assert_eq!(key.first, "a.jpg");
    /// assert_eq!(key.reversed().to_string(), "b.jpg---a.jpg");
    /// ```
    pub fn parse(key: &str) -> Result<Self, SourceError> {
        match key.split_once(PAIR_KEY_SEPARATOR) {
            Some((first, second))
                if !first.is_empty()
                    && !second.is_empty()
                    && !second.contains(PAIR_KEY_SEPARATOR) =>
            {
                Ok(Self::new(first, second))
            }
            _ => Err(SourceError::MalformedPairKey(key.to_string())),
        }
    }

    /// The key of the opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.second.clone(), self.first.clone())
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.first, PAIR_KEY_SEPARATOR, self.second)
    }
}

/// Fold two image ids into an order independent pair id.
///
/// The smaller id is multiplied by [`MAX_IMAGE_ID`] and the larger one added.
pub fn pair_id(image_id1: u32, image_id2: u32) -> u64 {
    let (lo, hi) = if image_id1 > image_id2 {
        (image_id2, image_id1)
    } else {
        (image_id1, image_id2)
    };
    MAX_IMAGE_ID * lo as u64 + hi as u64
}

/// An error type for the matching module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MatchingError {
    /// A flattened pixel index decodes outside of an image.
    #[error("pixel index {0} decodes to ({1}, {2}) which is outside of a {3}x{4} image")]
    PixelOutOfBounds(u32, usize, usize, usize, usize),

    /// Flattened indices cannot be decoded with zero columns.
    #[error("the column count used to decode pixel indices must be positive")]
    ZeroColumns,
}

/// Errors of a prediction source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Error reading or writing the archive file.
    #[error("failed to manipulate the archive file. {0}")]
    Io(#[from] std::io::Error),

    /// Error encoding the archive.
    #[error("failed to encode the archive. {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Error decoding the archive.
    #[error("failed to decode the archive. {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The file does not start with the archive magic bytes.
    #[error("not a prediction archive")]
    InvalidMagic,

    /// The archive was written with an unknown format version.
    #[error("unsupported prediction archive version {0}")]
    UnsupportedVersion(u32),

    /// A pair key does not follow the `imageA---imageB` pattern.
    #[error("malformed pair key: {0}")]
    MalformedPairKey(String),

    /// A stored depth map does not match its declared size.
    #[error("corrupted depth map for {0}. {1}")]
    CorruptedDepth(String, depthmatch_image::ImageError),
}

/// Errors of a correspondence sink.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// Error reading or writing the record file.
    #[error("failed to manipulate the record file. {0}")]
    Io(#[from] std::io::Error),

    /// Error encoding a record.
    #[error("failed to encode a record. {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Error decoding a record.
    #[error("failed to decode a record. {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The file does not start with the record file magic bytes.
    #[error("not a correspondence record file")]
    InvalidMagic,

    /// The file was written with an unknown format version.
    #[error("unsupported record file version {0}")]
    UnsupportedVersion(u32),

    /// The file ends in the middle of a record.
    #[error("record file truncated: expected {0} bytes, found {1}")]
    Truncated(usize, usize),
}

/// Errors loading an image.
#[derive(thiserror::Error, Debug)]
pub enum ImageLoadError {
    /// The requested image is not available.
    #[error("image does not exist: {0}")]
    NotFound(std::path::PathBuf),

    /// Error reading the file.
    #[error("failed to manipulate the file. {0}")]
    Io(#[from] std::io::Error),

    /// Error decoding the image.
    #[error("failed to decode the image. {0}")]
    Decode(#[from] image::ImageError),

    /// Error to create the image.
    #[error("failed to create image. {0}")]
    ImageCreation(#[from] depthmatch_image::ImageError),
}

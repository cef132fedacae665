use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use depthmatch_3d::pose::RelativePose;
use depthmatch_3d::warp::DepthMap;
use depthmatch_image::ImageSize;

use crate::error::SourceError;
use crate::pair::PairKey;

/// Magic bytes at the start of a prediction archive file.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"DMPA";

/// Current version of the prediction archive format.
pub const ARCHIVE_VERSION: u32 = 1;

/// The prediction of one directional image pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairPrediction {
    /// Inverse depth of the source image.
    pub depth: DepthMap,
    /// Relative pose from the source to the target camera.
    pub pose: RelativePose,
    /// Predicted scale of the translation.
    pub scale: f64,
}

/// A keyed source of depth and pose predictions.
///
/// A missing key is `Ok(None)`; data that exists but cannot be read is an error.
pub trait PredictionSource {
    /// All keys of the source, in iteration order. Keys are not validated.
    fn pair_keys(&self) -> Result<Vec<String>, SourceError>;

    /// Read the prediction stored under `key`.
    fn read(&self, key: &PairKey) -> Result<Option<PairPrediction>, SourceError>;
}

#[derive(bincode::Encode, bincode::Decode)]
struct ArchiveHeader {
    magic: [u8; 4],
    version: u32,
}

#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
struct StoredPrediction {
    width: u32,
    height: u32,
    depth: Vec<f32>,
    rotation: [[f64; 3]; 3],
    translation: [f64; 3],
    scale: f64,
}

impl StoredPrediction {
    fn from_prediction(prediction: &PairPrediction) -> Self {
        Self {
            width: prediction.depth.width() as u32,
            height: prediction.depth.height() as u32,
            depth: prediction.depth.as_slice().to_vec(),
            rotation: prediction.pose.rotation,
            translation: prediction.pose.translation,
            scale: prediction.scale,
        }
    }

    fn to_prediction(&self, key: &str) -> Result<PairPrediction, SourceError> {
        let size = ImageSize {
            width: self.width as usize,
            height: self.height as usize,
        };
        let depth = DepthMap::new(size, self.depth.clone())
            .map_err(|e| SourceError::CorruptedDepth(key.to_string(), e))?;
        Ok(PairPrediction {
            depth,
            pose: RelativePose::new(self.rotation, self.translation),
            scale: self.scale,
        })
    }
}

/// An ordered collection of predictions that can be stored in a versioned binary file.
///
/// Keys are kept as written and iterated in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionArchive {
    entries: BTreeMap<String, StoredPrediction>,
}

impl PredictionArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a prediction, replacing any previous entry under the same key.
    pub fn insert(&mut self, key: impl Into<String>, prediction: &PairPrediction) {
        self.entries
            .insert(key.into(), StoredPrediction::from_prediction(prediction));
    }

    /// The number of stored predictions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load an archive from a file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, does not start with [`ARCHIVE_MAGIC`], has a
    /// version other than [`ARCHIVE_VERSION`] or cannot be decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let config = bincode::config::standard();

        let header: ArchiveHeader = bincode::decode_from_std_read(&mut reader, config)?;
        if header.magic != ARCHIVE_MAGIC {
            return Err(SourceError::InvalidMagic);
        }
        if header.version != ARCHIVE_VERSION {
            return Err(SourceError::UnsupportedVersion(header.version));
        }

        let entries: BTreeMap<String, StoredPrediction> =
            bincode::decode_from_std_read(&mut reader, config)?;
        log::debug!(
            "loaded {} predictions from {}",
            entries.len(),
            path.as_ref().display()
        );

        Ok(Self { entries })
    }

    /// Write the archive to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SourceError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let config = bincode::config::standard();

        let header = ArchiveHeader {
            magic: ARCHIVE_MAGIC,
            version: ARCHIVE_VERSION,
        };
        bincode::encode_into_std_write(&header, &mut writer, config)?;
        bincode::encode_into_std_write(&self.entries, &mut writer, config)?;
        writer.flush()?;

        Ok(())
    }
}

impl PredictionSource for PredictionArchive {
    fn pair_keys(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn read(&self, key: &PairKey) -> Result<Option<PairPrediction>, SourceError> {
        let key = key.to_string();
        self.entries
            .get(&key)
            .map(|stored| stored.to_prediction(&key))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(value: f32) -> PairPrediction {
        PairPrediction {
            depth: DepthMap::from_size_val(
                ImageSize {
                    width: 3,
                    height: 2,
                },
                value,
            ),
            pose: RelativePose::new(
                [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
                [0.1, 0.2, 0.3],
            ),
            scale: 1.5,
        }
    }

    #[test]
    fn test_missing_key_is_none() -> Result<(), SourceError> {
        let mut archive = PredictionArchive::new();
        archive.insert("a---b", &prediction(1.0));
        assert_eq!(archive.read(&PairKey::new("a", "b"))?, Some(prediction(1.0)));
        assert_eq!(archive.read(&PairKey::new("b", "a"))?, None);
        Ok(())
    }

    #[test]
    fn test_keys_are_ordered() -> Result<(), SourceError> {
        let mut archive = PredictionArchive::new();
        archive.insert("c---a", &prediction(1.0));
        archive.insert("a---c", &prediction(2.0));
        archive.insert("broken", &prediction(3.0));
        assert_eq!(archive.pair_keys()?, vec!["a---c", "broken", "c---a"]);
        assert_eq!(archive.len(), 3);
        Ok(())
    }

    #[test]
    fn test_corrupted_depth_is_error() {
        let mut archive = PredictionArchive::new();
        archive.insert("a---b", &prediction(1.0));
        if let Some(stored) = archive.entries.get_mut("a---b") {
            stored.depth.pop();
        }
        assert!(matches!(
            archive.read(&PairKey::new("a", "b")),
            Err(SourceError::CorruptedDepth(key, _)) if key == "a---b"
        ));
    }
}

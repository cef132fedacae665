use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use depthmatch_matching::Correspondence;

use crate::error::SinkError;
use crate::pair::{pair_id, PairKey};
use crate::registration::ImageRegistration;

/// Magic bytes at the start of a record file.
pub const RECORD_FILE_MAGIC: [u8; 4] = *b"DMRF";

/// Current version of the record file format.
pub const RECORD_FILE_VERSION: u32 = 1;

/// Two-view configuration tag of calibrated correspondences.
pub const CALIBRATED_CONFIG: u32 = 3;

/// The pose forwarded with a batch of correspondences.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub enum MatchPose {
    /// Correspondences only.
    Geometric,
    /// Correspondences together with the predicted relative pose.
    PoseAugmented {
        /// The rotation as an angle-axis vector.
        rotation: [f32; 3],
        /// The translation.
        translation: [f32; 3],
    },
}

/// The accepted correspondences of one image pair.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct MatchRecord {
    /// The directional pair key `name1---name2`.
    pub pair_key: String,
    /// The order independent id of the image pair.
    pub pair_id: u64,
    /// The id of the source image.
    pub image_id1: u32,
    /// The id of the target image.
    pub image_id2: u32,
    /// The file name of the source image.
    pub image_name1: String,
    /// The file name of the target image.
    pub image_name2: String,
    /// The two-view configuration tag.
    pub config: u32,
    /// Keypoint index pairs `[index in image 1, index in image 2]`.
    pub matches: Vec<[u32; 2]>,
    /// The pose forwarded with the correspondences.
    pub pose: MatchPose,
}

impl MatchRecord {
    /// Build the record of a pair from its accepted correspondences.
    pub fn new(
        key: &PairKey,
        image_id1: u32,
        image_id2: u32,
        matches: &[Correspondence],
        pose: MatchPose,
    ) -> Self {
        Self {
            pair_key: key.to_string(),
            pair_id: pair_id(image_id1, image_id2),
            image_id1,
            image_id2,
            image_name1: key.first.clone(),
            image_name2: key.second.clone(),
            config: CALIBRATED_CONFIG,
            matches: matches.iter().map(|m| [m.source, m.target]).collect(),
            pose,
        }
    }

    /// The number of correspondences.
    pub fn rows(&self) -> usize {
        self.matches.len()
    }

    /// The number of columns of the correspondence table, always 2.
    pub fn cols(&self) -> usize {
        2
    }
}

/// A registered image together with the id the sink assigned to it.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct RegisteredImage {
    /// The assigned image id.
    pub image_id: u32,
    /// The registration data.
    pub registration: ImageRegistration,
}

/// One entry of a record file.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub enum SinkRecord {
    /// An image registration.
    Image(RegisteredImage),
    /// A batch of correspondences.
    Matches(MatchRecord),
}

#[derive(bincode::Encode, bincode::Decode)]
struct RecordFileHeader {
    magic: [u8; 4],
    version: u32,
}

/// Receives image registrations and accepted correspondences.
pub trait CorrespondenceSink {
    /// Register an image and return its id.
    ///
    /// Registering a name a second time returns the first id and stores nothing.
    fn register_image(&mut self, registration: &ImageRegistration) -> Result<u32, SinkError>;

    /// Store the correspondences of one pair.
    fn write_matches(&mut self, record: &MatchRecord) -> Result<(), SinkError>;
}

// Ids handed out by a sink, starting at 1.
#[derive(Debug, Default)]
struct ImageIds {
    ids: HashMap<String, u32>,
}

impl ImageIds {
    // Returns the id and whether it was just assigned.
    fn assign(&mut self, name: &str) -> (u32, bool) {
        if let Some(id) = self.ids.get(name) {
            return (*id, false);
        }
        let id = self.ids.len() as u32 + 1;
        self.ids.insert(name.to_string(), id);
        (id, true)
    }
}

/// A sink keeping every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    ids: ImageIds,
    /// The records in the order they were written.
    pub records: Vec<SinkRecord>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored correspondence records.
    pub fn match_records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.iter().filter_map(|r| match r {
            SinkRecord::Matches(m) => Some(m),
            SinkRecord::Image(_) => None,
        })
    }

    /// The stored image registrations.
    pub fn images(&self) -> impl Iterator<Item = &RegisteredImage> {
        self.records.iter().filter_map(|r| match r {
            SinkRecord::Image(i) => Some(i),
            SinkRecord::Matches(_) => None,
        })
    }
}

impl CorrespondenceSink for MemorySink {
    fn register_image(&mut self, registration: &ImageRegistration) -> Result<u32, SinkError> {
        let (image_id, is_new) = self.ids.assign(&registration.name);
        if is_new {
            self.records.push(SinkRecord::Image(RegisteredImage {
                image_id,
                registration: registration.clone(),
            }));
        }
        Ok(image_id)
    }

    fn write_matches(&mut self, record: &MatchRecord) -> Result<(), SinkError> {
        self.records.push(SinkRecord::Matches(record.clone()));
        Ok(())
    }
}

/// A sink appending length-prefixed bincode records to a file.
///
/// The file starts with a header holding [`RECORD_FILE_MAGIC`] and [`RECORD_FILE_VERSION`].
/// Each record is its encoded length as a little-endian `u32` followed by the encoded
/// [`SinkRecord`].
pub struct RecordFileSink {
    writer: BufWriter<File>,
    ids: ImageIds,
}

impl RecordFileSink {
    /// Create the record file, truncating any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let header = RecordFileHeader {
            magic: RECORD_FILE_MAGIC,
            version: RECORD_FILE_VERSION,
        };
        bincode::encode_into_std_write(&header, &mut writer, bincode::config::standard())?;

        Ok(Self {
            writer,
            ids: ImageIds::default(),
        })
    }

    fn write_record(&mut self, record: &SinkRecord) -> Result<(), SinkError> {
        let bytes = bincode::encode_to_vec(record, bincode::config::standard())?;
        self.writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
        self.writer.write_all(&bytes)?;
        Ok(())
    }

    /// Flush buffered records to the file.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl CorrespondenceSink for RecordFileSink {
    fn register_image(&mut self, registration: &ImageRegistration) -> Result<u32, SinkError> {
        let (image_id, is_new) = self.ids.assign(&registration.name);
        if is_new {
            self.write_record(&SinkRecord::Image(RegisteredImage {
                image_id,
                registration: registration.clone(),
            }))?;
        }
        Ok(image_id)
    }

    fn write_matches(&mut self, record: &MatchRecord) -> Result<(), SinkError> {
        self.write_record(&SinkRecord::Matches(record.clone()))
    }
}

/// Read every record of a record file.
///
/// # Errors
///
/// Fails on a foreign or newer file, on undecodable records and on a file that ends in the
/// middle of a record.
pub fn read_record_file(path: impl AsRef<Path>) -> Result<Vec<SinkRecord>, SinkError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let config = bincode::config::standard();

    let header: RecordFileHeader = bincode::decode_from_std_read(&mut reader, config)?;
    if header.magic != RECORD_FILE_MAGIC {
        return Err(SinkError::InvalidMagic);
    }
    if header.version != RECORD_FILE_VERSION {
        return Err(SinkError::UnsupportedVersion(header.version));
    }

    let mut records = Vec::new();
    loop {
        let mut len = [0u8; 4];
        match reader.read_exact(&mut len) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len) as usize;

        let mut bytes = Vec::new();
        let read = reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
        if read != len {
            return Err(SinkError::Truncated(len, read));
        }

        let (record, _): (SinkRecord, usize) = bincode::decode_from_slice(&bytes, config)?;
        records.push(record);
    }

    Ok(records)
}

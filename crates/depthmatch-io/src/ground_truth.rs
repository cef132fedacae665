use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use depthmatch_3d::pose::{CameraPose, RelativePose};

use crate::pair::PairKey;

/// Error types for the ground truth files.
#[derive(Debug, thiserror::Error)]
pub enum GroundTruthError {
    /// Error reading or writing file
    #[error("error reading or writing file")]
    IoError(#[from] std::io::Error),

    /// A line has fewer fields than its record needs
    #[error("line {0}: expected at least {1} fields, found {2}")]
    MissingFields(usize, usize, usize),

    /// Parse error
    #[error("line {0}: parse error {1}")]
    ParseError(usize, String),
}

/// The ground truth absolute pose of one image.
///
/// One line per image: `IMAGE_ID CAMERA_ID NAME QW QX QY QZ TX TY TZ R00 .. R22 AX AY AZ`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthImage {
    /// The id of the image.
    pub image_id: u32,
    /// The id of the camera.
    pub camera_id: u32,
    /// The file name of the image.
    pub name: String,
    /// The world to camera rotation as a quaternion `[w, x, y, z]`.
    pub quaternion: [f64; 4],
    /// The world to camera translation.
    pub translation: [f64; 3],
    /// The world to camera rotation matrix (row-major).
    pub rotation: [[f64; 3]; 3],
    /// The world to camera rotation as an angle-axis vector.
    pub angle_axis: [f64; 3],
}

impl GroundTruthImage {
    /// The absolute pose of the image, using the stored rotation matrix.
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            rotation: self.rotation,
            translation: self.translation,
        }
    }
}

/// The ground truth relative pose of one image pair.
///
/// One line per pair:
/// `ID1 ID2 QW QX QY QZ TX TY TZ CAMERA_ID1 NAME1 CAMERA_ID2 NAME2 R00 .. R22`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthRelativePose {
    /// The id of the source image.
    pub image_id1: u32,
    /// The id of the target image.
    pub image_id2: u32,
    /// The relative rotation as a quaternion `[w, x, y, z]`.
    pub quaternion: [f64; 4],
    /// The relative translation.
    pub translation: [f64; 3],
    /// The camera id of the source image.
    pub camera_id1: u32,
    /// The file name of the source image.
    pub name1: String,
    /// The camera id of the target image.
    pub camera_id2: u32,
    /// The file name of the target image.
    pub name2: String,
    /// The relative rotation matrix (row-major).
    pub rotation: [[f64; 3]; 3],
}

impl GroundTruthRelativePose {
    /// The pair key `name1---name2`.
    pub fn key(&self) -> PairKey {
        PairKey::new(self.name1.clone(), self.name2.clone())
    }

    /// The relative pose, using the stored rotation matrix.
    pub fn pose(&self) -> RelativePose {
        RelativePose::new(self.rotation, self.translation)
    }
}

/// One processed pair in the relative pose output file.
///
/// Written as `PAIR ID1 NAME1 ID2 NAME2 TX TY TZ RX RY RZ`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativePoseRecord {
    /// The directional pair key.
    pub key: PairKey,
    /// The id of the source image.
    pub image_id1: u32,
    /// The id of the target image.
    pub image_id2: u32,
    /// The translation forwarded with the correspondences.
    pub translation: [f64; 3],
    /// The rotation forwarded with the correspondences, as an angle-axis vector.
    pub rotation: [f64; 3],
}

/// Read the ground truth image poses.
///
/// Blank lines and lines starting with `#` are skipped.
///
/// # Arguments
///
/// * `path` - The path to the images file.
///
/// # Returns
///
/// The records in file order.
pub fn read_images_txt(path: impl AsRef<Path>) -> Result<Vec<GroundTruthImage>, GroundTruthError> {
    read_records(path, parse_image_line)
}

/// Read the ground truth relative poses.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn read_relative_poses_txt(
    path: impl AsRef<Path>,
) -> Result<Vec<GroundTruthRelativePose>, GroundTruthError> {
    read_records(path, parse_relative_pose_line)
}

/// Write one line per processed pair.
pub fn write_relative_poses_txt(
    path: impl AsRef<Path>,
    records: &[RelativePoseRecord],
) -> Result<(), GroundTruthError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for r in records {
        writeln!(
            writer,
            "{} {} {} {} {} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
            r.key,
            r.image_id1,
            r.key.first,
            r.image_id2,
            r.key.second,
            r.translation[0],
            r.translation[1],
            r.translation[2],
            r.rotation[0],
            r.rotation[1],
            r.rotation[2],
        )?;
    }
    writer.flush()?;

    Ok(())
}

fn read_records<T>(
    path: impl AsRef<Path>,
    parse: fn(usize, &[&str]) -> Result<T, GroundTruthError>,
) -> Result<Vec<T>, GroundTruthError> {
    // open the file and create a buffered reader
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts = line.split_whitespace().collect::<Vec<_>>();
        records.push(parse(i + 1, &parts)?);
    }

    Ok(records)
}

fn parse_part<T: std::str::FromStr>(line: usize, s: &str) -> Result<T, GroundTruthError>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| GroundTruthError::ParseError(line, format!("{}: {}", s, e)))
}

fn parse_array<const N: usize>(line: usize, parts: &[&str]) -> Result<[f64; N], GroundTruthError> {
    let mut out = [0.0; N];
    for (o, s) in out.iter_mut().zip(parts.iter()) {
        *o = parse_part(line, s)?;
    }
    Ok(out)
}

fn parse_matrix(line: usize, parts: &[&str]) -> Result<[[f64; 3]; 3], GroundTruthError> {
    Ok([
        parse_array(line, &parts[0..3])?,
        parse_array(line, &parts[3..6])?,
        parse_array(line, &parts[6..9])?,
    ])
}

fn check_fields(line: usize, parts: &[&str], expected: usize) -> Result<(), GroundTruthError> {
    if parts.len() < expected {
        return Err(GroundTruthError::MissingFields(line, expected, parts.len()));
    }
    Ok(())
}

fn parse_image_line(line: usize, parts: &[&str]) -> Result<GroundTruthImage, GroundTruthError> {
    check_fields(line, parts, 22)?;

    Ok(GroundTruthImage {
        image_id: parse_part(line, parts[0])?,
        camera_id: parse_part(line, parts[1])?,
        name: parts[2].to_string(),
        quaternion: parse_array(line, &parts[3..7])?,
        translation: parse_array(line, &parts[7..10])?,
        rotation: parse_matrix(line, &parts[10..19])?,
        angle_axis: parse_array(line, &parts[19..22])?,
    })
}

fn parse_relative_pose_line(
    line: usize,
    parts: &[&str],
) -> Result<GroundTruthRelativePose, GroundTruthError> {
    check_fields(line, parts, 22)?;

    Ok(GroundTruthRelativePose {
        image_id1: parse_part(line, parts[0])?,
        image_id2: parse_part(line, parts[1])?,
        quaternion: parse_array(line, &parts[2..6])?,
        translation: parse_array(line, &parts[6..9])?,
        camera_id1: parse_part(line, parts[9])?,
        name1: parts[10].to_string(),
        camera_id2: parse_part(line, parts[11])?,
        name2: parts[12].to_string(),
        rotation: parse_matrix(line, &parts[13..22])?,
    })
}

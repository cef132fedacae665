use std::collections::HashMap;
use std::path::{Path, PathBuf};

use depthmatch_image::{Image, ImageSize};

use crate::error::ImageLoadError;

/// A source of RGB images looked up by file name.
pub trait ImageProvider {
    /// Load the image called `name`.
    fn load(&self, name: &str) -> Result<Image<u8, 3>, ImageLoadError>;
}

/// Reads an RGB8 image from the given file path.
///
/// Any format enabled in the image crate is accepted and converted to RGB.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An image containing the image data.
pub fn read_image_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, ImageLoadError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(ImageLoadError::NotFound(file_path.to_path_buf()));
    }

    let img = image::open(file_path)?.into_rgb8();
    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(Image::new(size, img.into_raw())?)
}

/// Images stored as files under one directory.
#[derive(Debug, Clone)]
pub struct DirectoryImages {
    root: PathBuf,
}

impl DirectoryImages {
    /// Look up images under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The path of the image called `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl ImageProvider for DirectoryImages {
    fn load(&self, name: &str) -> Result<Image<u8, 3>, ImageLoadError> {
        read_image_rgb8(self.path(name))
    }
}

/// Images kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryImages {
    images: HashMap<String, Image<u8, 3>>,
}

impl MemoryImages {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the image called `name`.
    pub fn insert(&mut self, name: impl Into<String>, image: Image<u8, 3>) {
        self.images.insert(name.into(), image);
    }
}

impl ImageProvider for MemoryImages {
    fn load(&self, name: &str) -> Result<Image<u8, 3>, ImageLoadError> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| ImageLoadError::NotFound(PathBuf::from(name)))
    }
}

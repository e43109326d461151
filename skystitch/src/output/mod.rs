//! Output persistence for retrieved composites.
//!
//! Filenames record the zoom level the composite was fetched at plus a
//! timestamp, so repeated runs over the same area never collide.

use crate::retrieval::RetrievedImage;
use chrono::Local;
use image::buffer::ConvertBuffer;
use image::RgbImage;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while persisting a composite.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The output directory could not be created
    #[error("failed to create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    /// Encoding or writing the image file failed
    #[error("failed to write image: {0}")]
    Write(#[from] image::ImageError),
}

/// Writes retrieved composites into a target directory as JPEG.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    /// Creates a writer targeting `dir`. The directory is created lazily
    /// on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persists the composite as `aerial_{level}_{timestamp}.jpeg` and
    /// returns the written path.
    pub fn write_jpeg(&self, retrieved: &RetrievedImage) -> Result<PathBuf, OutputError> {
        fs::create_dir_all(&self.dir).map_err(|source| OutputError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
        let path = self
            .dir
            .join(format!("aerial_{}_{}.jpeg", retrieved.level, timestamp));

        // JPEG has no alpha channel; composites are fully opaque anyway.
        let rgb: RgbImage = retrieved.image.convert();
        rgb.save(&path)?;

        info!(path = %path.display(), level = retrieved.level, "Composite written");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

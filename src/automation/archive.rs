//! Archive of processed frames for offline OCR debugging.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Saves processed frames as timestamped JPEGs under one directory.
#[derive(Debug, Clone)]
pub struct CaptureArchive {
    dir: PathBuf,
}

impl CaptureArchive {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `img` to `<dir>/<YYYYmmdd_HHMMSS_mmm>.jpg` and returns the path.
    pub fn save(&self, img: &GrayImage) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).context("Failed to create capture directory")?;
        let path = self.dir.join(capture_filename(&Local::now()));
        img.save(&path)
            .with_context(|| format!("Failed to save capture {}", path.display()))?;
        Ok(path)
    }
}

/// Millisecond-resolution file name for a capture taken at `at`.
pub fn capture_filename(at: &DateTime<Local>) -> String {
    format!("{}.jpg", at.format("%Y%m%d_%H%M%S_%3f"))
}

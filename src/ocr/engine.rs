use anyhow::{anyhow, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Characters the OCR engine may emit.
pub const DIGIT_WHITELIST: &str = "0123456789";

/// Recognizes digit text in a preprocessed image.
///
/// Implementations must not keep state between calls: the same image must
/// always produce the same text.
pub trait OcrEngine {
    fn recognize_digits(&self, img: &GrayImage) -> Result<String>;
}

/// Runs the Tesseract executable as a subprocess.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(paths: TesseractPaths) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
        }
    }

    /// Arguments after the input path: stdout output, single text block,
    /// digits only, no interword spacing.
    fn args(&self) -> Vec<String> {
        let mut args = vec!["stdout".to_string()];
        if let Some(tessdata) = &self.tessdata {
            args.push("--tessdata-dir".to_string());
            args.push(tessdata.to_string_lossy().to_string());
        }
        args.extend(
            [
                "-l",
                "eng",
                "--psm",
                "6", // Assume single uniform block of text
                "-c",
            ]
            .map(String::from),
        );
        args.push(format!("tessedit_char_whitelist={}", DIGIT_WHITELIST));
        args.push("-c".to_string());
        args.push("preserve_interword_spaces=0".to_string());
        args
    }
}

impl OcrEngine for TesseractCli {
    fn recognize_digits(&self, img: &GrayImage) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .args(self.args())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

/// Characters the recognizer may emit. UI labels are upper-case, digits and dashes.
pub const CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789- ";

/// Anything that turns a preprocessed image into text.
pub trait OcrEngine {
    fn recognize(&self, img: &GrayImage) -> Result<String>;
}

/// Runs the Tesseract command-line program.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    page_seg_mode: u8,
}

impl TesseractEngine {
    pub fn new(executable: PathBuf, tessdata: Option<PathBuf>, page_seg_mode: u8) -> Self {
        Self {
            executable,
            tessdata,
            page_seg_mode,
        }
    }

    fn command_for(&self, input: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata);
        }
        cmd.arg("-l")
            .arg("eng")
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", CHAR_WHITELIST));
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    /// Returns the raw text Tesseract prints for the image.
    fn recognize(&self, img: &GrayImage) -> Result<String> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write image for Tesseract")?;

        let output = self
            .command_for(temp_input.path())
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

//! Diagnostic crops written next to quarantined screenshots.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::ocr::preprocess::crop_region;
use crate::sorter::config::CropRegion;

pub const DEBUG_CROP_PREFIX: &str = "crop_debug_";

/// Writes `crop_debug_<label>.png` files into a weapon's `failed` folder.
#[derive(Debug, Clone)]
pub struct DebugCropDumper {
    failed_dir: PathBuf,
}

impl DebugCropDumper {
    pub fn new(failed_dir: impl Into<PathBuf>) -> Self {
        Self {
            failed_dir: failed_dir.into(),
        }
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        self.failed_dir
            .join(format!("{}{}.png", DEBUG_CROP_PREFIX, label))
    }

    /// Crops `region` from `img` and saves it under `label`, overwriting.
    pub fn dump(&self, img: &RgbaImage, region: &CropRegion, label: &str) -> Result<PathBuf> {
        let path = self.path_for(label);
        crop_region(img, region)
            .save(&path)
            .with_context(|| format!("Failed to save debug crop {}", path.display()))?;
        crate::log(&format!("Saved cropped image for debugging: {}", path.display()));
        Ok(path)
    }
}

/// True for the dumper's own output files.
pub fn is_debug_crop(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(DEBUG_CROP_PREFIX))
}

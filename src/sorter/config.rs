//! Configuration types for the sorter.
//!
//! The base directory and the two crop rectangles come from the environment
//! (`BASE_DIR`, `CROP_AREA_TYPE`, `CROP_AREA_NAME`, optionally via `.env`).
//! Preprocessing knobs come from an optional config.json next to the executable.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_BASE_DIR: &str = "BASE_DIR";
pub const ENV_CROP_AREA_TYPE: &str = "CROP_AREA_TYPE";
pub const ENV_CROP_AREA_NAME: &str = "CROP_AREA_NAME";

/// A rectangle in absolute pixel coordinates.
/// `right` and `bottom` are exclusive, matching how the crop utility reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl FromStr for CropRegion {
    type Err = anyhow::Error;

    /// Parses `left,top,right,bottom`.
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .with_context(|| format!("Invalid coordinate {:?} in {:?}", part.trim(), s))
            })
            .collect::<Result<Vec<u32>>>()?;

        let &[left, top, right, bottom] = values.as_slice() else {
            bail!(
                "Expected 4 comma-separated integers (left,top,right,bottom), got {}: {:?}",
                values.len(),
                s
            );
        };

        if right <= left || bottom <= top {
            bail!("Crop region {:?} has no area (right must exceed left, bottom must exceed top)", s);
        }

        Ok(Self { left, top, right, bottom })
    }
}

impl fmt::Display for CropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

/// The two named label regions read from every screenshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionConfig {
    /// Where the attachment type label is rendered (top-left of the UI)
    pub type_region: CropRegion,
    /// Where the attachment name label is rendered
    pub name_region: CropRegion,
}

/// Image preprocessing parameters applied before recognition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreprocessSettings {
    /// Contrast multiplier around the mean luminance
    #[serde(default = "default_contrast_factor")]
    pub contrast_factor: f32,
    /// Pixels strictly brighter than this become white, everything else black
    #[serde(default = "default_binarize_threshold")]
    pub binarize_threshold: u8,
    /// Tesseract page segmentation mode
    #[serde(default = "default_page_seg_mode")]
    pub page_seg_mode: u8,
}

fn default_contrast_factor() -> f32 {
    2.0
}

fn default_binarize_threshold() -> u8 {
    128
}

fn default_page_seg_mode() -> u8 {
    6 // Assume a single uniform block of text
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            contrast_factor: default_contrast_factor(),
            binarize_threshold: default_binarize_threshold(),
            page_seg_mode: default_page_seg_mode(),
        }
    }
}

impl PreprocessSettings {
    /// Loads settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        crate::log(&format!("Looking for config at: {}", path.display()));

        if !path.exists() {
            crate::log("config.json not found. Using default preprocessing.");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    crate::log("Preprocessing settings loaded from config.json");
                    settings
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                    Self::default()
                }
            },
            Err(e) => {
                crate::log(&format!("Failed to read config.json: {}. Using defaults.", e));
                Self::default()
            }
        }
    }
}

/// Complete sorter configuration, built once at startup and passed by reference.
#[derive(Clone, Debug)]
pub struct SorterConfig {
    pub base_dir: PathBuf,
    pub regions: RegionConfig,
    pub preprocess: PreprocessSettings,
}

impl SorterConfig {
    /// Builds the configuration from process environment variables.
    pub fn from_env(preprocess: PreprocessSettings) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), preprocess)
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F, preprocess: PreprocessSettings) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} is not set", key))
        };

        let base_dir = PathBuf::from(require(ENV_BASE_DIR)?.trim());
        if !base_dir.is_dir() {
            bail!("{} does not point to a directory: {}", ENV_BASE_DIR, base_dir.display());
        }

        let type_region = require(ENV_CROP_AREA_TYPE)?
            .parse()
            .with_context(|| format!("Failed to parse {}", ENV_CROP_AREA_TYPE))?;
        let name_region = require(ENV_CROP_AREA_NAME)?
            .parse()
            .with_context(|| format!("Failed to parse {}", ENV_CROP_AREA_NAME))?;

        Ok(Self {
            base_dir,
            regions: RegionConfig { type_region, name_region },
            preprocess,
        })
    }
}

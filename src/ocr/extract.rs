use anyhow::{bail, Context, Result};
use image::RgbaImage;
use std::path::Path;

use super::engine::OcrEngine;
use super::preprocess::{crop_region, prepare_for_ocr};
use crate::log;
use crate::sorter::config::{CropRegion, PreprocessSettings};

/// Turns a screenshot (or one region of it) into raw recognized text.
pub struct TextExtractor<'a, E: OcrEngine> {
    engine: &'a E,
    settings: &'a PreprocessSettings,
}

impl<'a, E: OcrEngine> TextExtractor<'a, E> {
    pub fn new(engine: &'a E, settings: &'a PreprocessSettings) -> Self {
        Self { engine, settings }
    }

    /// Recognizes text in the whole image.
    pub fn extract(&self, img: &RgbaImage) -> Result<String> {
        let prepared = prepare_for_ocr(img, self.settings);
        self.engine.recognize(&prepared)
    }

    /// Crops `region` out of the image and recognizes its text.
    ///
    /// When `save_crop` is given, the crop is written there (before any
    /// preprocessing) so the operator can see exactly what was read.
    pub fn extract_region(
        &self,
        img: &RgbaImage,
        region: &CropRegion,
        save_crop: Option<&Path>,
    ) -> Result<String> {
        let cropped = crop_region(img, region);
        if cropped.width() == 0 || cropped.height() == 0 {
            bail!(
                "Crop region {} lies outside the {}x{} image",
                region,
                img.width(),
                img.height()
            );
        }

        if let Some(path) = save_crop {
            cropped
                .save(path)
                .with_context(|| format!("Failed to save crop to {}", path.display()))?;
            log(&format!("Saved cropped image for debugging: {}", path.display()));
        }

        self.extract(&cropped)
    }
}

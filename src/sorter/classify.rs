//! Attachment classification.
//!
//! Reads a screenshot through the text extractor and decides whether it shows
//! the unmodified weapon, a specific attachment, or something unreadable.
//! Nothing here moves files; see `organize` for that.

use anyhow::Result;
use image::RgbaImage;
use std::fmt;
use std::path::Path;

use crate::ocr::{OcrEngine, TextExtractor};
use crate::sorter::config::{PreprocessSettings, RegionConfig};
use crate::sorter::debug_crop::DebugCropDumper;

/// Text the game shows on a weapon with nothing attached.
pub const BASE_MARKER: &str = "NO MODIFICATIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    MissingType,
    MissingName,
    ExtractionError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::MissingType => "no attachment type recognized",
            FailureReason::MissingName => "no attachment name recognized",
            FailureReason::ExtractionError => "text extraction failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationResult {
    Base,
    Classified {
        attachment_type: String,
        attachment_name: String,
    },
    Failed {
        reason: FailureReason,
    },
}

impl ClassificationResult {
    pub fn failed(reason: FailureReason) -> Self {
        ClassificationResult::Failed { reason }
    }
}

/// Keeps ASCII letters, digits, underscores, hyphens and spaces; any other
/// whitespace becomes a space and everything else is dropped. The result is
/// trimmed, so it is always safe as a single path segment.
pub fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' ' => Some(c),
            c if c.is_whitespace() => Some(' '),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Decides the outcome for the two region readings. A missing name wins over a
/// missing type.
pub fn decide(raw_type: &str, raw_name: &str) -> ClassificationResult {
    let attachment_type = sanitize_label(raw_type);
    let attachment_name = sanitize_label(raw_name);

    if attachment_name.is_empty() {
        ClassificationResult::failed(FailureReason::MissingName)
    } else if attachment_type.is_empty() {
        ClassificationResult::failed(FailureReason::MissingType)
    } else {
        ClassificationResult::Classified {
            attachment_type,
            attachment_name,
        }
    }
}

/// Identifies a screenshot inside debug crop names: the file stem, plus the
/// extension when it is not `png` so `shot3.png` and `shot3.jpg` stay apart.
pub fn file_label(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    match file.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()) {
        Some(ext) if ext != "png" => format!("{}_{}", stem, ext),
        _ => stem,
    }
}

enum Reading {
    Base,
    Labels { raw_type: String, raw_name: String },
}

pub struct Classifier<'a, E: OcrEngine> {
    extractor: TextExtractor<'a, E>,
    regions: &'a RegionConfig,
}

impl<'a, E: OcrEngine> Classifier<'a, E> {
    pub fn new(engine: &'a E, settings: &'a PreprocessSettings, regions: &'a RegionConfig) -> Self {
        Self {
            extractor: TextExtractor::new(engine, settings),
            regions,
        }
    }

    /// Loads and classifies the screenshot at `file`.
    pub fn classify(&self, file: &Path, dumper: &DebugCropDumper) -> ClassificationResult {
        let img = match image::open(file) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                crate::log(&format!("Failed to load {}: {}", file.display(), e));
                return ClassificationResult::failed(FailureReason::ExtractionError);
            }
        };

        self.classify_image(&img, &file_label(file), dumper)
    }

    /// Classifies an already-decoded screenshot. `label` names the extra
    /// debug crop written when no attachment name could be read.
    pub fn classify_image(
        &self,
        img: &RgbaImage,
        label: &str,
        dumper: &DebugCropDumper,
    ) -> ClassificationResult {
        let (raw_type, raw_name) = match self.read(img, dumper) {
            Ok(Reading::Base) => return ClassificationResult::Base,
            Ok(Reading::Labels { raw_type, raw_name }) => (raw_type, raw_name),
            Err(e) => {
                crate::log(&format!("Error identifying attachment in {}: {:#}", label, e));
                return ClassificationResult::failed(FailureReason::ExtractionError);
            }
        };

        let result = decide(&raw_type, &raw_name);

        if result == ClassificationResult::failed(FailureReason::MissingName) {
            let crop_label = format!("failed_name_{}", label);
            if let Err(e) = dumper.dump(img, &self.regions.name_region, &crop_label) {
                crate::log(&format!("{:#}", e));
            }
        }

        result
    }

    fn read(&self, img: &RgbaImage, dumper: &DebugCropDumper) -> Result<Reading> {
        let full_text = self.extractor.extract(img)?;
        if full_text.contains(BASE_MARKER) {
            return Ok(Reading::Base);
        }

        let raw_type = self.extractor.extract_region(
            img,
            &self.regions.type_region,
            Some(dumper.path_for("type").as_path()),
        )?;
        crate::log(&format!("Attachment type text: {}", raw_type.trim()));

        let raw_name = self.extractor.extract_region(
            img,
            &self.regions.name_region,
            Some(dumper.path_for("name").as_path()),
        )?;
        crate::log(&format!("Attachment name text: {}", raw_name.trim()));

        Ok(Reading::Labels { raw_type, raw_name })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sorter::config::CropRegion;
    use anyhow::anyhow;
    use image::{GrayImage, ImageBuffer, Rgba};
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// Answers by image size, so whole-image, type-region and name-region reads
    /// can be scripted independently. Unknown sizes read as empty text.
    pub(crate) struct ScriptedEngine {
        answers: HashMap<(u32, u32), Result<String, String>>,
    }

    impl ScriptedEngine {
        pub(crate) fn new() -> Self {
            Self { answers: HashMap::new() }
        }

        pub(crate) fn answer(mut self, size: (u32, u32), text: &str) -> Self {
            self.answers.insert(size, Ok(text.to_string()));
            self
        }

        pub(crate) fn fail(mut self, size: (u32, u32)) -> Self {
            self.answers.insert(size, Err("engine crashed".to_string()));
            self
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, img: &GrayImage) -> Result<String> {
            match self.answers.get(&img.dimensions()) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(msg)) => Err(anyhow!(msg.clone())),
                None => Ok(String::new()),
            }
        }
    }

    pub(crate) const SCREEN: (u32, u32) = (320, 180);
    pub(crate) const TYPE_SIZE: (u32, u32) = (60, 20);
    pub(crate) const NAME_SIZE: (u32, u32) = (120, 30);

    pub(crate) fn regions() -> RegionConfig {
        RegionConfig {
            type_region: CropRegion { left: 10, top: 10, right: 70, bottom: 30 },
            name_region: CropRegion { left: 100, top: 75, right: 220, bottom: 105 },
        }
    }

    pub(crate) fn screenshot() -> RgbaImage {
        ImageBuffer::from_fn(SCREEN.0, SCREEN.1, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 40, 255]))
    }

    fn classify_with(engine: &ScriptedEngine, dumper: &DebugCropDumper) -> ClassificationResult {
        let settings = PreprocessSettings::default();
        let regions = regions();
        let classifier = Classifier::new(engine, &settings, &regions);
        classifier.classify_image(&screenshot(), "shot", dumper)
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("VLK-Optic!!2"), "VLK-Optic2");
        assert_eq!(sanitize_label("  OPTIC \n"), "OPTIC");
        assert_eq!(sanitize_label("VLK 3.0x"), "VLK 30x");
        assert_eq!(sanitize_label("a/b\\c:d"), "abcd");
        assert_eq!(sanitize_label("MUZZLE\nBRAKE"), "MUZZLE BRAKE");
        assert_eq!(sanitize_label("..."), "");
        assert_eq!(sanitize_label("ÉTÉ_9"), "T_9");
    }

    #[test]
    fn test_sanitize_label_is_idempotent() {
        for raw in ["VLK-Optic!!2", " \t A_B-c \r\n", "", "!!!", "x\u{0}y", "Z 3.0x  ", "ｆｕｌｌ"] {
            let once = sanitize_label(raw);
            assert_eq!(sanitize_label(&once), once, "not idempotent for {:?}", raw);
            assert!(!once.chars().any(|c| c.is_control() || c == '/' || c == '\\'));
        }
    }

    #[test]
    fn test_decide() {
        assert_eq!(
            decide("OPTIC\n", "VLK 3.0x"),
            ClassificationResult::Classified {
                attachment_type: "OPTIC".to_string(),
                attachment_name: "VLK 30x".to_string(),
            }
        );
        assert_eq!(decide("", "NAME"), ClassificationResult::failed(FailureReason::MissingType));
        assert_eq!(decide("TYPE", "!!"), ClassificationResult::failed(FailureReason::MissingName));
        // Name check takes priority
        assert_eq!(decide("", ""), ClassificationResult::failed(FailureReason::MissingName));
    }

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(Path::new("w/shot3.png")), "shot3");
        assert_eq!(file_label(Path::new("w/shot3.PNG")), "shot3");
        assert_eq!(file_label(Path::new("w/shot3.jpg")), "shot3_jpg");
        assert_eq!(file_label(Path::new("w/shot3.JPEG")), "shot3_jpeg");
        assert_eq!(file_label(Path::new("w/shot3")), "shot3");
    }

    #[test]
    fn test_failed_name_crops_distinct_per_extension() {
        let dir = tempdir().unwrap();
        let dumper = DebugCropDumper::new(dir.path().join("failed"));
        std::fs::create_dir_all(dir.path().join("failed")).unwrap();
        let png = dir.path().join("shot3.png");
        let jpg = dir.path().join("shot3.jpg");
        screenshot().save(&png).unwrap();
        image::DynamicImage::ImageRgba8(screenshot()).to_rgb8().save(&jpg).unwrap();

        let engine = ScriptedEngine::new().answer(TYPE_SIZE, "OPTIC");
        let settings = PreprocessSettings::default();
        let regions = regions();
        let classifier = Classifier::new(&engine, &settings, &regions);

        for file in [&png, &jpg] {
            assert_eq!(
                classifier.classify(file, &dumper),
                ClassificationResult::failed(FailureReason::MissingName)
            );
        }

        assert!(dumper.path_for("failed_name_shot3").exists());
        assert!(dumper.path_for("failed_name_shot3_jpg").exists());
    }

    #[test]
    fn test_base_screenshot() {
        let dir = tempdir().unwrap();
        let dumper = DebugCropDumper::new(dir.path());
        let engine = ScriptedEngine::new()
            .answer(SCREEN, "GUNSMITH\nNO MODIFICATIONS\n")
            .answer(TYPE_SIZE, "OPTIC")
            .answer(NAME_SIZE, "VLK");

        assert_eq!(classify_with(&engine, &dumper), ClassificationResult::Base);
        // Region reads are skipped entirely
        assert!(!dumper.path_for("type").exists());
        assert!(!dumper.path_for("name").exists());
    }

    #[test]
    fn test_classified_screenshot_saves_region_crops() {
        let dir = tempdir().unwrap();
        let dumper = DebugCropDumper::new(dir.path());
        let engine = ScriptedEngine::new()
            .answer(SCREEN, "SOMETHING ELSE")
            .answer(TYPE_SIZE, "OPTIC\n")
            .answer(NAME_SIZE, "VLK 3.0x\n");

        assert_eq!(
            classify_with(&engine, &dumper),
            ClassificationResult::Classified {
                attachment_type: "OPTIC".to_string(),
                attachment_name: "VLK 30x".to_string(),
            }
        );
        assert!(dumper.path_for("type").exists());
        assert!(dumper.path_for("name").exists());
        assert!(!dumper.path_for("failed_name_shot").exists());
    }

    #[test]
    fn test_missing_name_writes_failed_name_crop() {
        let dir = tempdir().unwrap();
        let dumper = DebugCropDumper::new(dir.path());
        let engine = ScriptedEngine::new()
            .answer(TYPE_SIZE, "OPTIC")
            .answer(NAME_SIZE, " ?! ");

        assert_eq!(
            classify_with(&engine, &dumper),
            ClassificationResult::failed(FailureReason::MissingName)
        );

        let crop = image::open(dumper.path_for("failed_name_shot")).unwrap();
        assert_eq!((crop.width(), crop.height()), NAME_SIZE);
    }

    #[test]
    fn test_missing_type_has_no_failed_name_crop() {
        let dir = tempdir().unwrap();
        let dumper = DebugCropDumper::new(dir.path());
        let engine = ScriptedEngine::new().answer(NAME_SIZE, "VLK");

        assert_eq!(
            classify_with(&engine, &dumper),
            ClassificationResult::failed(FailureReason::MissingType)
        );
        assert!(!dumper.path_for("failed_name_shot").exists());
    }

    #[test]
    fn test_engine_error_is_extraction_error() {
        let dir = tempdir().unwrap();
        let dumper = DebugCropDumper::new(dir.path());

        let whole = ScriptedEngine::new().fail(SCREEN);
        assert_eq!(
            classify_with(&whole, &dumper),
            ClassificationResult::failed(FailureReason::ExtractionError)
        );

        // A failing name read discards the good type read
        let name = ScriptedEngine::new().answer(TYPE_SIZE, "OPTIC").fail(NAME_SIZE);
        assert_eq!(
            classify_with(&name, &dumper),
            ClassificationResult::failed(FailureReason::ExtractionError)
        );
    }

    #[test]
    fn test_unreadable_file_is_extraction_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("broken.png");
        std::fs::write(&file, b"not a png").unwrap();
        let dumper = DebugCropDumper::new(dir.path());
        let engine = ScriptedEngine::new();
        let settings = PreprocessSettings::default();
        let regions = regions();
        let classifier = Classifier::new(&engine, &settings, &regions);

        assert_eq!(
            classifier.classify(&file, &dumper),
            ClassificationResult::failed(FailureReason::ExtractionError)
        );
    }
}

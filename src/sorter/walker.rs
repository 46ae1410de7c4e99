//! Folder walking.
//!
//! Descends `<base>/<game>/<weapon type>/<weapon>` and, in each weapon folder,
//! feeds eligible screenshots through the classifier and organizer.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::ocr::OcrEngine;
use crate::sorter::classify::{ClassificationResult, Classifier};
use crate::sorter::config::SorterConfig;
use crate::sorter::debug_crop::{is_debug_crop, DebugCropDumper};
use crate::sorter::organize::{place, FAILED_DIR_NAME};

/// Image extensions considered screenshots.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Depth of weapon folders below the base directory (game / weapon type / weapon).
const WEAPON_FOLDER_DEPTH: usize = 3;

/// Outcome counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub weapon_folders: usize,
    pub base: usize,
    pub classified: usize,
    pub failed: usize,
    pub errors: usize,
}

impl RunSummary {
    fn record(&mut self, result: &ClassificationResult) {
        match result {
            ClassificationResult::Base => self.base += 1,
            ClassificationResult::Classified { .. } => self.classified += 1,
            ClassificationResult::Failed { .. } => self.failed += 1,
        }
    }

    fn absorb(&mut self, other: RunSummary) {
        self.weapon_folders += other.weapon_folders;
        self.base += other.base;
        self.classified += other.classified;
        self.failed += other.failed;
        self.errors += other.errors;
    }
}

/// A file may be classified if it sits directly in the weapon folder or
/// directly in its `failed` folder. Anything deeper, anything in an attachment
/// folder, non-images and debug crops are skipped.
pub fn is_eligible(weapon_folder: &Path, file: &Path) -> bool {
    let Ok(relative) = file.strip_prefix(weapon_folder) else {
        return false;
    };

    let components: Vec<Component> = relative.components().collect();
    let in_place = match components.as_slice() {
        [Component::Normal(_)] => true,
        [Component::Normal(dir), Component::Normal(_)] => *dir == FAILED_DIR_NAME,
        _ => false,
    };

    in_place && has_image_extension(file) && !is_debug_crop(file)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Lists the eligible screenshots in a weapon folder, sorted by path.
pub fn eligible_files(weapon_folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(weapon_folder)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                crate::log(&format!("Skipping unreadable entry: {}", e));
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_eligible(weapon_folder, path))
        .collect();

    files.sort();
    files
}

/// Lists `<base>/<game>/<weapon type>/<weapon>` folders, sorted by path.
pub fn weapon_folders(base_dir: &Path) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = WalkDir::new(base_dir)
        .follow_links(true)
        .min_depth(WEAPON_FOLDER_DEPTH)
        .max_depth(WEAPON_FOLDER_DEPTH)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                crate::log(&format!("Skipping unreadable folder: {}", e));
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();

    folders.sort();
    folders
}

/// Classifies and files every eligible screenshot in one weapon folder.
/// A failure on one file is logged and the pass moves on.
pub fn process_weapon_folder<E: OcrEngine>(
    classifier: &Classifier<'_, E>,
    weapon_folder: &Path,
) -> Result<RunSummary> {
    let failed_dir = weapon_folder.join(FAILED_DIR_NAME);
    fs::create_dir_all(&failed_dir)
        .with_context(|| format!("Failed to create {}", failed_dir.display()))?;
    let dumper = DebugCropDumper::new(failed_dir);

    let mut summary = RunSummary {
        weapon_folders: 1,
        ..RunSummary::default()
    };

    for file in eligible_files(weapon_folder) {
        let result = classifier.classify(&file, &dumper);
        match place(&file, &result, weapon_folder) {
            Ok(_) => summary.record(&result),
            Err(e) => {
                crate::log(&format!("Error processing {}: {:#}", file.display(), e));
                summary.errors += 1;
            }
        }
    }

    Ok(summary)
}

/// Runs one full pass over every weapon folder under the base directory.
pub fn run<E: OcrEngine>(config: &SorterConfig, engine: &E) -> RunSummary {
    let classifier = Classifier::new(engine, &config.preprocess, &config.regions);
    let mut summary = RunSummary::default();

    for weapon_folder in weapon_folders(&config.base_dir) {
        crate::log(&format!("Processing {}", weapon_folder.display()));
        match process_weapon_folder(&classifier, &weapon_folder) {
            Ok(folder_summary) => summary.absorb(folder_summary),
            Err(e) => {
                crate::log(&format!("Error processing {}: {:#}", weapon_folder.display(), e));
                summary.errors += 1;
            }
        }
    }

    summary
}

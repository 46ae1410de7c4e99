//! Loadout Sorter
//!
//! Batch job that files game-screenshots of weapon attachments into
//! `<game>/<weapon type>/<weapon>/<attachment type>/<attachment name>.png`
//! by reading the on-screen labels with Tesseract OCR.

mod ocr;
mod paths;
mod sorter;

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

use ocr::TesseractEngine;
use sorter::{PreprocessSettings, SorterConfig};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths::get_log_file())
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    paths::ensure_directories()?;

    // Environment first: .env in the working directory may supply BASE_DIR etc.
    dotenv::dotenv().ok();

    let preprocess = PreprocessSettings::load(&paths::get_config_file());
    let config = SorterConfig::from_env(preprocess).context("Invalid configuration")?;
    log(&format!(
        "Sorting {} (type region {}, name region {})",
        config.base_dir.display(),
        config.regions.type_region,
        config.regions.name_region
    ));

    let tesseract = ocr::ensure_tesseract().context("Failed to set up Tesseract")?;
    let engine = TesseractEngine::new(
        tesseract.executable,
        tesseract.tessdata,
        config.preprocess.page_seg_mode,
    );

    let summary = sorter::run(&config, &engine);
    log(&format!(
        "Done: {} weapon folders, {} base, {} classified, {} failed, {} errors",
        summary.weapon_folders, summary.base, summary.classified, summary.failed, summary.errors
    ));

    Ok(())
}

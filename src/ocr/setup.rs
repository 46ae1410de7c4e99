use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;
use crate::paths::get_data_dir;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";
const ENG_TRAINEDDATA: &str = "eng.traineddata";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

const COMMON_TESSDATA: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` when Tesseract's built-in data location should be used.
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for storing a downloaded tessdata copy
pub fn get_tessdata_dir() -> PathBuf {
    get_data_dir().join("tessdata")
}

/// Ensures a Tesseract executable and English trained data are available.
/// Downloads eng.traineddata if no usable copy is found.
pub fn ensure_tesseract() -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;
    log(&format!("Using Tesseract: {}", executable.display()));

    let tessdata = match find_tessdata_dir() {
        Some(dir) => {
            log(&format!("Using tessdata: {}", dir.display()));
            Some(dir)
        }
        None if executable_has_eng(&executable) => {
            log("Using Tesseract's bundled tessdata");
            None
        }
        None => {
            log("eng.traineddata not found locally, downloading...");
            let dir = get_tessdata_dir();
            fs::create_dir_all(&dir)?;
            download_tessdata(&dir)?;
            Some(dir)
        }
    };

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Finds the Tesseract executable, checking our local dir first, then PATH,
/// then common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_data_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new(EXECUTABLE_NAME).arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from(EXECUTABLE_NAME));
        }
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| {
            anyhow!(
                "Tesseract not found. Please install Tesseract-OCR and add it to PATH, \
                 or copy the executable to: {}",
                get_data_dir().display()
            )
        })
}

/// Finds a directory containing eng.traineddata.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }
    candidates.push(get_tessdata_dir());
    candidates.extend(COMMON_TESSDATA.iter().map(PathBuf::from));

    candidates.into_iter().find(|dir| has_eng_traineddata(dir))
}

fn has_eng_traineddata(dir: &Path) -> bool {
    dir.join(ENG_TRAINEDDATA).exists()
}

/// Asks the executable which languages it can load without an explicit tessdata dir.
fn executable_has_eng(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--list-langs")
        .output()
        .map(|output| {
            output.status.success()
                && String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .any(|line| line.trim() == "eng")
        })
        .unwrap_or(false)
}

/// Downloads English trained data
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let eng_url = format!("{}/{}", TESSDATA_REPO, ENG_TRAINEDDATA);
    let eng_path = tessdata_dir.join(ENG_TRAINEDDATA);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&eng_url)
        .header("User-Agent", "loadout-sorter")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            ENG_TRAINEDDATA,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&eng_path)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {} ({} bytes)",
        ENG_TRAINEDDATA,
        bytes.len()
    ));

    Ok(())
}

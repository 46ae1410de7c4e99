//! Filing of classified screenshots.
//!
//! All destination paths and every move happen here. Moves replace whatever is
//! already at the destination; the most recent screenshot wins.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::sorter::classify::ClassificationResult;

pub const BASE_DIR_NAME: &str = "base";
pub const BASE_FILE_NAME: &str = "base.png";
pub const FAILED_DIR_NAME: &str = "failed";

/// Computes where `file` belongs inside `weapon_folder` for the given result.
pub fn destination_for(
    file: &Path,
    result: &ClassificationResult,
    weapon_folder: &Path,
) -> Result<PathBuf> {
    let destination = match result {
        ClassificationResult::Base => weapon_folder.join(BASE_DIR_NAME).join(BASE_FILE_NAME),
        ClassificationResult::Classified {
            attachment_type,
            attachment_name,
        } => weapon_folder
            .join(attachment_type)
            .join(format!("{}.png", attachment_name)),
        ClassificationResult::Failed { .. } => {
            let file_name = file
                .file_name()
                .ok_or_else(|| anyhow!("{} has no file name", file.display()))?;
            weapon_folder.join(FAILED_DIR_NAME).join(file_name)
        }
    };
    Ok(destination)
}

/// Moves `file` to its destination, creating folders as needed, and returns
/// the destination path.
pub fn place(file: &Path, result: &ClassificationResult, weapon_folder: &Path) -> Result<PathBuf> {
    let destination = destination_for(file, result, weapon_folder)?;

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    move_replacing(file, &destination)?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match result {
        ClassificationResult::Failed { reason } => crate::log(&format!(
            "Failed to identify attachment for {} ({}), moved to {}",
            file_name,
            reason,
            destination.display()
        )),
        _ => crate::log(&format!("Moved {} to {}", file_name, destination.display())),
    }

    Ok(destination)
}

/// Renames `from` over `to`. When the two sit on different filesystems the
/// content is staged in a temp file next to `to` and persisted over it, so a
/// half-written destination is never visible.
fn move_replacing(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => Err(e).with_context(|| {
            format!("Failed to move {} to {}", from.display(), to.display())
        }),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    let dir = to
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", to.display()))?;

    let mut staged = NamedTempFile::new_in(dir)?;
    let mut source =
        fs::File::open(from).with_context(|| format!("Failed to open {}", from.display()))?;
    io::copy(&mut source, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    staged
        .persist(to)
        .with_context(|| format!("Failed to replace {}", to.display()))?;

    fs::remove_file(from).with_context(|| format!("Failed to remove {}", from.display()))?;
    Ok(())
}

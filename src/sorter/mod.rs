//! Screenshot sorting pipeline.
//!
//! This module provides:
//! - Configuration (base directory, crop regions, preprocessing)
//! - Attachment classification from OCR text
//! - Filing of screenshots into the weapon folder hierarchy
//! - Folder walking and per-run summaries

pub mod classify;
pub mod config;
pub mod debug_crop;
pub mod organize;
pub mod walker;

pub use config::{PreprocessSettings, SorterConfig};
pub use walker::run;

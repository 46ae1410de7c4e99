pub mod setup;
pub mod preprocess;
pub mod engine;
pub mod extract;

pub use setup::ensure_tesseract;
pub use engine::{OcrEngine, TesseractEngine};
pub use extract::TextExtractor;

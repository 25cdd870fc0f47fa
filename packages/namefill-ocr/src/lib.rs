pub mod engine;
pub mod tesseract;
pub mod word;

pub use engine::{OcrEngine, OcrError, OcrOutput};
pub use tesseract::TesseractOcrEngine;
pub use word::{BoundingBox, Word};

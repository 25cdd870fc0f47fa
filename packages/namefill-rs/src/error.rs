//! Error taxonomy for a fill attempt.
use namefill_ocr::OcrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FillError {
    /// The page could not be turned into an image. Fatal to the OCR attempt;
    /// callers may still place text heuristically.
    #[error("rasterization failed: {0}")]
    Rasterization(String),
    /// Recoverable: the locator treats it as "no label found".
    #[error("ocr failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("text measurement failed: {0}")]
    Measurement(String),
    /// Page geometry is unavailable, so no position can be computed at all.
    #[error("no insertion point: {0}")]
    NoInsertionPoint(String),
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FillError>;

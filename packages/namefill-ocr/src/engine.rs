use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::word::Word;

#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub words: Vec<Word>,
}

impl OcrOutput {
    pub fn from_words(words: Vec<Word>) -> Self {
        Self { words }
    }
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    EngineError(String),
}

/// Word-level recognizer. No text on the image is an empty output, not an error.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<OcrOutput, OcrError>;
}

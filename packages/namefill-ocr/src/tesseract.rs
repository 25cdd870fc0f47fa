use std::path::Path;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::engine::{OcrEngine, OcrError, OcrOutput};
use crate::word::{BoundingBox, Word};

/// Tesseract row level for individual words in TSV output.
const WORD_LEVEL: i32 = 5;
/// Fully automatic page segmentation.
const PAGE_SEGMENTATION: u32 = 3;

/// Runs the `tesseract` binary and keeps its word-level TSV rows.
#[derive(Debug, Clone)]
pub struct TesseractOcrEngine {
    languages: String,
    dpi: u32,
}

impl TesseractOcrEngine {
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
            dpi: 300,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    fn command(&self, image: &Path) -> Command {
        let mut cmd = Command::new("tesseract");
        cmd.arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(PAGE_SEGMENTATION.to_string())
            .arg("--dpi")
            .arg(self.dpi.to_string())
            .arg("tsv")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for TesseractOcrEngine {
    fn default() -> Self {
        Self::new("eng")
    }
}

fn check_status(output: Output) -> Result<String, OcrError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::EngineError(format!(
            "tesseract failed: {}",
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn spawn_error(e: std::io::Error) -> OcrError {
    OcrError::EngineError(format!("failed to run tesseract (is it installed?): {e}"))
}

#[async_trait]
impl OcrEngine for TesseractOcrEngine {
    async fn recognize(&self, image: &Path) -> Result<OcrOutput, OcrError> {
        if !image.is_file() {
            return Err(OcrError::InvalidInput(format!(
                "no image at {}",
                image.display()
            )));
        }
        let output = self.command(image).output().await.map_err(spawn_error)?;
        let tsv = check_status(output)?;

        let words = parse_tsv_words(&tsv);
        debug!(words = words.len(), "tesseract recognized words");
        Ok(OcrOutput::from_words(words))
    }
}

/// Parses tesseract TSV output into words, in the order tesseract emitted them.
/// Rows without text or with a negative confidence are skipped.
pub fn parse_tsv_words(tsv: &str) -> Vec<Word> {
    let mut words = Vec::new();

    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() < 12 {
            continue;
        }
        let level: i32 = cols[0].parse().unwrap_or(0);
        if level != WORD_LEVEL {
            continue;
        }
        let left: f32 = cols[6].parse().unwrap_or(0.0);
        let top: f32 = cols[7].parse().unwrap_or(0.0);
        let width: f32 = cols[8].parse().unwrap_or(0.0);
        let height: f32 = cols[9].parse().unwrap_or(0.0);
        let conf: f32 = cols[10].parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        words.push(Word {
            text: text.to_string(),
            bbox: BoundingBox::new(left, top, left + width, top + height),
            confidence: conf.min(100.0),
        });
    }

    words
}

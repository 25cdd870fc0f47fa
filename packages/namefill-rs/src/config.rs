//! Tunable constants for detection and layout, loadable from a JSON file.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FillError, Result};

/// Page-relative anchor used when no label is found on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackAnchor {
    /// Fraction of the page width.
    pub x: f32,
    /// Fraction of the page height, measured from the bottom edge.
    pub y: f32,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Vertical bucket size, in pixels, for grouping words into lines.
    pub line_tolerance_px: f32,
    /// A label match above this mean OCR confidence ends the search.
    pub label_confidence_threshold: f32,
    /// Maximum number of words folded into a label box.
    pub max_label_words: usize,
    /// Horizontal gap between the field region and the inserted text.
    pub insert_gap: f32,
    pub start_font_size: f32,
    pub min_font_size: f32,
    pub right_margin: f32,
    /// Lower bound on the width handed to the font shrink computation.
    pub min_available_width: f32,
    pub name_field_anchor: FallbackAnchor,
    pub common_anchor: FallbackAnchor,
    pub raster_dpi: u32,
    pub ocr_language: String,
    /// Upper bound on rasterization plus OCR. `None` waits indefinitely.
    pub ocr_timeout_ms: Option<u64>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            line_tolerance_px: 10.0,
            label_confidence_threshold: 30.0,
            max_label_words: 3,
            insert_gap: 6.0,
            start_font_size: 12.0,
            min_font_size: 8.0,
            right_margin: 20.0,
            min_available_width: 30.0,
            name_field_anchor: FallbackAnchor {
                x: 0.30,
                y: 0.75,
                confidence: 0.8,
            },
            common_anchor: FallbackAnchor {
                x: 0.25,
                y: 0.65,
                confidence: 0.6,
            },
            raster_dpi: 200,
            ocr_language: "eng".to_string(),
            ocr_timeout_ms: None,
        }
    }
}

impl LocatorConfig {
    /// Reads a JSON config file. Keys that are absent keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: LocatorConfig = serde_json::from_str(&raw)
            .map_err(|e| FillError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.line_tolerance_px <= 0.0 {
            return Err(FillError::Config("line_tolerance_px must be positive".into()));
        }
        if self.max_label_words == 0 {
            return Err(FillError::Config("max_label_words must be at least 1".into()));
        }
        if self.min_font_size <= 0.0 || self.start_font_size < self.min_font_size {
            return Err(FillError::Config(
                "start_font_size must be >= min_font_size > 0".into(),
            ));
        }
        if self.raster_dpi == 0 {
            return Err(FillError::Config("raster_dpi must be positive".into()));
        }
        Ok(())
    }

    pub fn ocr_timeout(&self) -> Option<Duration> {
        self.ocr_timeout_ms.map(Duration::from_millis)
    }
}

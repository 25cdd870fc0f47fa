//! Turns a matched label into the fillable region next to it, in page units.
use std::sync::OnceLock;

use namefill_ocr::BoundingBox;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::geometry::{pixel_box_to_page, ImageSize, PageSize};
use crate::label_matcher::LabelMatch;
use crate::line_grouper::Line;

static BLANK_RUN: OnceLock<Regex> = OnceLock::new();

fn blank_run_pattern() -> &'static Regex {
    BLANK_RUN.get_or_init(|| Regex::new(r"^[_\-]{2,}$").expect("blank run pattern is a valid regex"))
}

/// Heuristic that produced a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    OcrDetected,
    NameFieldDetected,
    CommonPosition,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::OcrDetected => "ocr_detected",
            Strategy::NameFieldDetected => "name_field_detected",
            Strategy::CommonPosition => "common_position",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Region of the page expected to receive the text. `(x, y)` is the
/// bottom-left corner in page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// OCR scale `[0, 100]` when detected, `[0, 1]` for fallbacks.
    pub confidence: f32,
    pub strategy: Strategy,
}

pub fn is_blank_run(text: &str) -> bool {
    blank_run_pattern().is_match(text.trim())
}

/// Grows the label box over underscore or dash runs to its right on the same
/// line. Other words are left out.
pub fn extend_over_blanks(label: &BoundingBox, line: &Line) -> BoundingBox {
    line.words
        .iter()
        .filter(|w| w.bbox.x0 >= label.x1 && is_blank_run(&w.text))
        .fold(*label, |acc, w| acc.union(&w.bbox))
}

/// Pixel-space label plus blanks, converted to a page-space region. The
/// confidence is the label's own; blank runs do not contribute.
pub fn estimate_region(
    label: &LabelMatch,
    line: &Line,
    image: ImageSize,
    page: PageSize,
) -> FieldRegion {
    let extended = extend_over_blanks(&label.bbox, line);
    let rect = pixel_box_to_page(&extended, image, page);
    debug!(
        px_x0 = extended.x0,
        px_x1 = extended.x1,
        x = rect.x,
        y = rect.y,
        width = rect.width,
        "estimated field region"
    );
    FieldRegion {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        confidence: label.confidence,
        strategy: Strategy::OcrDetected,
    }
}

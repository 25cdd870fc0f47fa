//! Picks the insertion point: a detected label region when there is one,
//! otherwise a fixed prior for typical single-page portrait forms.
use namefill_ocr::Word;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{FallbackAnchor, LocatorConfig};
use crate::field_region::{estimate_region, FieldRegion, Strategy};
use crate::geometry::{ImageSize, PageSize};
use crate::label_matcher::find_label;
use crate::line_grouper::group_lines;

/// Where the text baseline starts, plus the region that justified it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsertionPoint {
    pub x: f32,
    pub y: f32,
    pub region: FieldRegion,
}

/// Runs line grouping, label matching and region estimation over OCR words.
/// Deterministic for identical input.
pub fn detect_region(
    words: &[Word],
    image: ImageSize,
    page: PageSize,
    config: &LocatorConfig,
) -> Option<FieldRegion> {
    let lines = group_lines(words, config.line_tolerance_px);
    let label = find_label(
        &lines,
        config.label_confidence_threshold,
        config.max_label_words,
    )?;
    let line = lines.get(label.line_index)?;
    Some(estimate_region(&label, line, image, page))
}

/// True when a known form field name hints that the page carries a name field.
pub fn mentions_name_field<S: AsRef<str>>(field_names: &[S]) -> bool {
    field_names.iter().any(|name| {
        let name = name.as_ref().to_lowercase();
        name.contains("name") || name.contains("full")
    })
}

fn anchored_region(anchor: &FallbackAnchor, page: PageSize, strategy: Strategy) -> FieldRegion {
    FieldRegion {
        x: page.width * anchor.x,
        y: page.height * anchor.y,
        width: 0.0,
        height: 0.0,
        confidence: anchor.confidence,
        strategy,
    }
}

/// Fallback region used when no label was detected.
pub fn fallback_region<S: AsRef<str>>(
    known_field_names: &[S],
    page: PageSize,
    config: &LocatorConfig,
) -> FieldRegion {
    if mentions_name_field(known_field_names) {
        anchored_region(&config.name_field_anchor, page, Strategy::NameFieldDetected)
    } else {
        anchored_region(&config.common_anchor, page, Strategy::CommonPosition)
    }
}

/// Chooses the insertion point.
///
/// A detected region puts the text `insert_gap` to its right, vertically
/// centred for `font_size`. Fallback regions are used as-is.
pub fn resolve<S: AsRef<str>>(
    detected: Option<FieldRegion>,
    known_field_names: &[S],
    page: PageSize,
    font_size: f32,
    config: &LocatorConfig,
) -> InsertionPoint {
    match detected {
        Some(region) => {
            let point = InsertionPoint {
                x: region.x + region.width + config.insert_gap,
                y: region.y + ((region.height - font_size) / 2.0).max(0.0),
                region,
            };
            info!(
                strategy = %region.strategy,
                confidence = region.confidence,
                x = point.x,
                y = point.y,
                "using detected field region"
            );
            point
        }
        None => {
            let region = fallback_region(known_field_names, page, config);
            debug!(known_fields = known_field_names.len(), "no label detected");
            info!(
                strategy = %region.strategy,
                confidence = region.confidence,
                x = region.x,
                y = region.y,
                "using fallback position"
            );
            InsertionPoint {
                x: region.x,
                y: region.y,
                region,
            }
        }
    }
}

//! Chooses the font size so the inserted text stays inside the right margin.
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LocatorConfig;
use crate::error::Result;
use crate::text_measure::TextMeasure;

/// Final placement handed to the drawing step. `(x, y)` is the text baseline
/// origin in page units, bottom-left origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawInstruction {
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub text: String,
    /// Rendered width at `font_size`.
    pub width: f32,
    /// The text still crosses the right margin at the minimum font size.
    pub overflows: bool,
}

/// Sizing limits for [`fit_text`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitLimits {
    pub start_size: f32,
    pub min_size: f32,
    pub right_margin: f32,
    pub min_available_width: f32,
}

impl Default for FitLimits {
    fn default() -> Self {
        Self::from(&LocatorConfig::default())
    }
}

impl From<&LocatorConfig> for FitLimits {
    fn from(config: &LocatorConfig) -> Self {
        Self {
            start_size: config.start_font_size,
            min_size: config.min_font_size,
            right_margin: config.right_margin,
            min_available_width: config.min_available_width,
        }
    }
}

/// Shrinks the font in one pass when the text would cross
/// `page_width - right_margin`. The size never grows and never drops below
/// `min_size`; if the floor still overflows the instruction is emitted anyway
/// with `overflows` set.
pub fn fit_text(
    x: f32,
    y: f32,
    text: &str,
    page_width: f32,
    limits: &FitLimits,
    measure: &dyn TextMeasure,
) -> Result<DrawInstruction> {
    let mut size = limits.start_size;
    let mut width = measure.text_width(text, size)?;

    if x + width + limits.right_margin > page_width {
        let available = (page_width - x - limits.right_margin).max(limits.min_available_width);
        let shrunk = (size * available / width.max(1.0)).floor();
        let next = shrunk.min(size).max(limits.min_size);
        debug!(from = size, to = next, available, "shrinking font to fit margin");
        size = next;
        width = measure.text_width(text, size)?;
    }

    let overflows = x + width + limits.right_margin > page_width;
    if overflows {
        warn!(
            x,
            width,
            page_width,
            font_size = size,
            "text overflows the right margin at the minimum font size"
        );
    }

    Ok(DrawInstruction {
        x,
        y,
        font_size: size,
        text: text.to_string(),
        width,
        overflows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_measure::Helvetica;

    /// Every character is exactly half the font size wide.
    struct HalfEm;

    impl TextMeasure for HalfEm {
        fn base_font(&self) -> &str {
            "HalfEm"
        }

        fn text_width(&self, text: &str, size: f32) -> Result<f32> {
            Ok(text.chars().count() as f32 * size * 0.5)
        }
    }

    #[test]
    fn test_fitting_text_keeps_start_size() {
        let out = fit_text(100.0, 700.0, "Jane Doe", 612.0, &FitLimits::default(), &Helvetica)
            .unwrap();
        assert_eq!(out.font_size, 12.0);
        assert!(!out.overflows);
        assert_eq!(out.x, 100.0);
        assert_eq!(out.y, 700.0);
        assert_eq!(out.text, "Jane Doe");
    }

    #[test]
    fn test_wide_text_shrinks_once() {
        // 20 chars at 12 => 120 wide; 100 + 120 + 20 > 200; available = 80; 12 * 80 / 120 = 8
        let out = fit_text(100.0, 0.0, "abcdefghijklmnopqrst", 200.0, &FitLimits::default(), &HalfEm)
            .unwrap();
        assert_eq!(out.font_size, 8.0);
        assert_eq!(out.width, 80.0);
        assert!(!out.overflows);
    }

    #[test]
    fn test_shrink_floors_fractional_size() {
        // 10 chars at 12 => 60; 100 + 60 + 20 = 180 > 170; available = 50; 12*50/60 = 10
        let out = fit_text(100.0, 0.0, "abcdefghij", 170.0, &FitLimits::default(), &HalfEm).unwrap();
        assert_eq!(out.font_size, 10.0);
        // available = 55 => 11.0
        let out = fit_text(100.0, 0.0, "abcdefghij", 175.0, &FitLimits::default(), &HalfEm).unwrap();
        assert_eq!(out.font_size, 11.0);
        // available = 57 => 11.4 floored to 11
        let out = fit_text(100.0, 0.0, "abcdefghij", 177.0, &FitLimits::default(), &HalfEm).unwrap();
        assert_eq!(out.font_size, 11.0);
    }

    #[test]
    fn test_never_below_minimum_and_overflow_is_flagged() {
        let text = "a very long name that will never fit on this page";
        let out = fit_text(580.0, 0.0, text, 612.0, &FitLimits::default(), &Helvetica).unwrap();
        assert_eq!(out.font_size, 8.0);
        assert!(out.overflows);
    }

    #[test]
    fn test_available_width_has_a_floor() {
        // x beyond the margin: available clamps to 30; 10 chars at 12 => 60; 12*30/60 = 6 -> 8
        let out = fit_text(600.0, 0.0, "abcdefghij", 612.0, &FitLimits::default(), &HalfEm).unwrap();
        assert_eq!(out.font_size, 8.0);
        assert_eq!(out.width, 40.0);
        assert!(out.overflows);
    }

    #[test]
    fn test_measurement_error_propagates() {
        assert!(fit_text(0.0, 0.0, "李", 612.0, &FitLimits::default(), &Helvetica).is_err());
    }
}

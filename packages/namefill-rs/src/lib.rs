//! # namefill-rs
//!
//! Puts a name into a PDF form. Documents with a fillable AcroForm name field
//! get the value drawn into it and the form flattened; flat or scanned pages are rasterized,
//! OCR'd, and searched for a "name" label whose blank receives the text.
//!
//! ## Pipeline
//!
//! - **Line grouping**: OCR words are bucketed into lines by vertical center
//! - **Label matching**: "full name", "surname", "name", ... with a word boundary
//! - **Field region**: the label box grows over `____` runs, then moves to page space
//! - **Position resolving**: detected region, else a known-field or common-position prior
//! - **Layout fitting**: the font shrinks once so the text respects the right margin
//!
//! ## Quick Start
//!
//! ```ignore
//! use namefill_rs::prelude::*;
//!
//! let locator = Locator::new(LocatorConfig::default());
//! let instruction = locator.locate_and_fit(&pdf_bytes, 0, "Jane Doe", &[]).await?;
//! println!("{} at ({}, {}) size {}", instruction.text, instruction.x, instruction.y, instruction.font_size);
//!
//! let outcome = FormFiller::new(locator).fill(&pdf_bytes, 0, "Jane Doe").await?;
//! std::fs::write("filled.pdf", outcome.pdf)?;
//! ```

pub mod config;
pub mod error;
pub mod field_region;
pub mod form_filler;
pub mod geometry;
pub mod label_matcher;
pub mod layout_fitter;
pub mod line_grouper;
pub mod locator;
pub mod logging;
pub mod pdf_form;
pub mod pdf_page;
pub mod position_resolver;
pub mod rasterizer;
pub mod text_measure;

// Re-export commonly used types at the root level
pub use config::{FallbackAnchor, LocatorConfig};
pub use error::{FillError, Result};
pub use field_region::{estimate_region, FieldRegion, Strategy};
pub use form_filler::{FillMethod, FillOutcome, FormFiller};
pub use geometry::{pixel_box_to_page, ImageSize, PageRect, PageSize};
pub use label_matcher::{find_label, LabelMatch};
pub use layout_fitter::{fit_text, DrawInstruction, FitLimits};
pub use line_grouper::{group_lines, Line};
pub use locator::{Locator, Placement};
pub use pdf_form::{field_listing, field_names, fill_name_field, flatten_form, FieldListing, FormField};
pub use position_resolver::{detect_region, resolve, InsertionPoint};
pub use rasterizer::{PdftoppmRasterizer, RasterPage, Rasterizer};
pub use text_measure::{Helvetica, TextMeasure};

pub use namefill_ocr::{BoundingBox, OcrEngine, OcrError, OcrOutput, TesseractOcrEngine, Word};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use namefill_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        detect_region, find_label, fit_text, group_lines, resolve, BoundingBox, DrawInstruction,
        FieldRegion, FillError, FillMethod, FillOutcome, FitLimits, FormFiller, Helvetica,
        LabelMatch, Line, Locator, LocatorConfig, OcrEngine, PageSize, ImageSize, Placement,
        Rasterizer, Strategy, TextMeasure, Word,
    };
}

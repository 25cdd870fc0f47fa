//! Page and image geometry, and the single pixel-to-page conversion.
//!
//! Images put the origin at the top-left with y growing downward. PDF pages
//! put it at the bottom-left with y growing upward. [`pixel_box_to_page`] is the
//! only place the two meet.
use namefill_ocr::BoundingBox;
use serde::Serialize;

/// Raster dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Page dimensions in PDF user units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Rectangle in page units; `(x, y)` is its bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scales a pixel box onto the page with independent horizontal and vertical
/// factors and flips the vertical axis.
pub fn pixel_box_to_page(bbox: &BoundingBox, image: ImageSize, page: PageSize) -> PageRect {
    let scale_x = page.width / image.width.max(1) as f32;
    let scale_y = page.height / image.height.max(1) as f32;
    PageRect {
        x: bbox.x0 * scale_x,
        y: page.height - bbox.y1 * scale_y,
        width: bbox.width() * scale_x,
        height: bbox.height() * scale_y,
    }
}

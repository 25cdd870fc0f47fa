//! Renders one PDF page to a PNG the OCR engine can read.
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use crate::error::{FillError, Result};
use crate::geometry::ImageSize;

/// A rendered page owned by the caller. The backing directory is removed
/// when the handle drops, whichever way the detection attempt ends.
#[derive(Debug)]
pub struct RasterPage {
    _dir: TempDir,
    path: PathBuf,
    size: ImageSize,
}

impl RasterPage {
    /// Wraps an image inside `dir`, reading its pixel dimensions.
    pub fn new(dir: TempDir, path: PathBuf) -> Result<Self> {
        let (width, height) = image::image_dimensions(&path).map_err(|e| {
            FillError::Rasterization(format!("unreadable page image {}: {}", path.display(), e))
        })?;
        Ok(Self {
            _dir: dir,
            path,
            size: ImageSize { width, height },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Renders the zero-based `page_index` of `document`.
    async fn rasterize(&self, document: &[u8], page_index: usize) -> Result<RasterPage>;
}

/// Rasterizes with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(200)
    }
}

#[async_trait]
impl Rasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, document: &[u8], page_index: usize) -> Result<RasterPage> {
        let dir = tempfile::Builder::new()
            .prefix("namefill-")
            .tempdir()
            .map_err(|e| FillError::Rasterization(format!("failed to create temp dir: {e}")))?;
        let input_path = dir.path().join("input.pdf");
        tokio::fs::write(&input_path, document)
            .await
            .map_err(|e| FillError::Rasterization(format!("failed to write temp pdf: {e}")))?;

        let page_number = (page_index + 1).to_string();
        let prefix = dir.path().join("page");
        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-singlefile")
            .arg(&input_path)
            .arg(&prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                FillError::Rasterization(format!(
                    "failed to run pdftoppm (install poppler): {e}"
                ))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FillError::Rasterization(format!(
                "pdftoppm failed: {}",
                stderr.trim()
            )));
        }

        let page = RasterPage::new(dir, prefix.with_extension("png"))?;
        debug!(
            page = page_index,
            width = page.size.width,
            height = page.size.height,
            "rasterized page"
        );
        Ok(page)
    }
}

//! One detection pass per request: rasterize, recognize, find the label,
//! resolve a position and fit the text.
use std::sync::Arc;

use namefill_ocr::{OcrEngine, TesseractOcrEngine};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LocatorConfig;
use crate::error::{FillError, Result};
use crate::field_region::FieldRegion;
use crate::geometry::PageSize;
use crate::layout_fitter::{fit_text, DrawInstruction, FitLimits};
use crate::pdf_page::{load_document, page_size};
use crate::position_resolver::{detect_region, resolve};
use crate::rasterizer::{PdftoppmRasterizer, Rasterizer};
use crate::text_measure::{Helvetica, TextMeasure};

/// The chosen region and the instruction derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub region: FieldRegion,
    pub instruction: DrawInstruction,
}

/// Finds where a name goes on a page. Holds no per-request state, so one
/// locator can serve concurrent requests.
pub struct Locator {
    config: LocatorConfig,
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<dyn OcrEngine>,
    measure: Arc<dyn TextMeasure>,
}

impl Locator {
    /// Locator backed by `pdftoppm`, `tesseract` and Helvetica metrics.
    pub fn new(config: LocatorConfig) -> Self {
        let rasterizer = Arc::new(PdftoppmRasterizer::new(config.raster_dpi));
        let ocr = Arc::new(TesseractOcrEngine::new(config.ocr_language.clone()).with_dpi(config.raster_dpi));
        Self::with_collaborators(config, rasterizer, ocr, Arc::new(Helvetica))
    }

    pub fn with_collaborators(
        config: LocatorConfig,
        rasterizer: Arc<dyn Rasterizer>,
        ocr: Arc<dyn OcrEngine>,
        measure: Arc<dyn TextMeasure>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            ocr,
            measure,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Rasterizes the page and looks for a label. OCR failures count as "no
    /// label"; rasterization failures are returned.
    pub async fn detect(
        &self,
        document: &[u8],
        page_index: usize,
        page: PageSize,
    ) -> Result<Option<FieldRegion>> {
        let raster = self.rasterizer.rasterize(document, page_index).await?;
        let words = match self.ocr.recognize(raster.path()).await.map_err(FillError::from) {
            Ok(output) => output.words,
            Err(e) => {
                warn!(error = %e, "ocr failed, using heuristic placement");
                return Ok(None);
            }
        };
        debug!(words = words.len(), "ocr finished");
        Ok(detect_region(&words, raster.size(), page, &self.config))
    }

    async fn detect_within_limit(
        &self,
        document: &[u8],
        page_index: usize,
        page: PageSize,
    ) -> Result<Option<FieldRegion>> {
        let attempt = self.detect(document, page_index, page);
        match self.config.ocr_timeout() {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(limit_ms = limit.as_millis() as u64, "detection timed out, using heuristic placement");
                    Ok(None)
                }
            },
            None => attempt.await,
        }
    }

    /// Resolves the position and fits `text` without any OCR evidence.
    pub fn place(
        &self,
        detected: Option<FieldRegion>,
        page: PageSize,
        text: &str,
        known_field_names: &[String],
    ) -> Result<Placement> {
        let point = resolve(
            detected,
            known_field_names,
            page,
            self.config.start_font_size,
            &self.config,
        );
        let instruction = fit_text(
            point.x,
            point.y,
            text,
            page.width,
            &FitLimits::from(&self.config),
            self.measure.as_ref(),
        )?;
        Ok(Placement {
            region: point.region,
            instruction,
        })
    }

    /// Full pass over an already measured page.
    pub async fn locate_on_page(
        &self,
        document: &[u8],
        page_index: usize,
        page: PageSize,
        text: &str,
        known_field_names: &[String],
    ) -> Result<Placement> {
        let detected = self.detect_within_limit(document, page_index, page).await?;
        self.place(detected, page, text, known_field_names)
    }

    /// Full pass over raw document bytes. Fails with `NoInsertionPoint` when
    /// the page geometry cannot be read, and with `Rasterization` when the page
    /// cannot be rendered.
    pub async fn locate(
        &self,
        document: &[u8],
        page_index: usize,
        text: &str,
        known_field_names: &[String],
    ) -> Result<Placement> {
        let page = load_document(document)
            .map_err(|e| FillError::NoInsertionPoint(format!("unreadable document: {e}")))
            .and_then(|doc| page_size(&doc, page_index))?;
        self.locate_on_page(document, page_index, page, text, known_field_names)
            .await
    }

    pub async fn locate_and_fit(
        &self,
        document: &[u8],
        page_index: usize,
        text: &str,
        known_field_names: &[String],
    ) -> Result<DrawInstruction> {
        Ok(self
            .locate(document, page_index, text, known_field_names)
            .await?
            .instruction)
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(LocatorConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::field_region::Strategy;
    use crate::pdf_page::{save_document, tests::blank_document};
    use crate::rasterizer::RasterPage;
    use async_trait::async_trait;
    use namefill_ocr::{BoundingBox, OcrError, OcrOutput, Word};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Writes a blank PNG of a fixed size and remembers where.
    pub(crate) struct FakeRasterizer {
        pub width: u32,
        pub height: u32,
        pub last_dir: Mutex<Option<PathBuf>>,
    }

    impl FakeRasterizer {
        pub(crate) fn letter() -> Self {
            Self {
                width: 1700,
                height: 2200,
                last_dir: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Rasterizer for FakeRasterizer {
        async fn rasterize(&self, _document: &[u8], _page_index: usize) -> Result<RasterPage> {
            let dir = tempfile::tempdir()?;
            let path = dir.path().join("page.png");
            image::GrayImage::new(self.width, self.height)
                .save(&path)
                .map_err(|e| FillError::Rasterization(e.to_string()))?;
            *self.last_dir.lock().unwrap() = Some(dir.path().to_path_buf());
            RasterPage::new(dir, path)
        }
    }

    struct BrokenRasterizer;

    #[async_trait]
    impl Rasterizer for BrokenRasterizer {
        async fn rasterize(&self, _document: &[u8], _page_index: usize) -> Result<RasterPage> {
            Err(FillError::Rasterization("no renderer".into()))
        }
    }

    pub(crate) enum FakeOcr {
        Words(Vec<Word>),
        Fails,
        Hangs,
    }

    #[async_trait]
    impl OcrEngine for FakeOcr {
        async fn recognize(&self, _image: &Path) -> std::result::Result<OcrOutput, OcrError> {
            match self {
                FakeOcr::Words(words) => Ok(OcrOutput::from_words(words.clone())),
                FakeOcr::Fails => Err(OcrError::EngineError("engine crashed".into())),
                FakeOcr::Hangs => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(OcrOutput::default())
                }
            }
        }
    }

    pub(crate) fn name_form_words() -> Vec<Word> {
        vec![
            Word::new("Name:", BoundingBox::new(100.0, 190.0, 180.0, 210.0), 92.0),
            Word::new("______", BoundingBox::new(185.0, 190.0, 400.0, 210.0), 80.0),
        ]
    }

    fn letter_pdf() -> Vec<u8> {
        save_document(&mut blank_document(612, 792, 1)).unwrap()
    }

    fn locator(config: LocatorConfig, rasterizer: Arc<dyn Rasterizer>, ocr: FakeOcr) -> Locator {
        Locator::with_collaborators(config, rasterizer, Arc::new(ocr), Arc::new(Helvetica))
    }

    #[tokio::test]
    async fn test_detected_label_end_to_end() {
        let rasterizer = Arc::new(FakeRasterizer::letter());
        let locator = locator(
            LocatorConfig::default(),
            rasterizer.clone(),
            FakeOcr::Words(name_form_words()),
        );
        let placement = locator.locate(&letter_pdf(), 0, "Jane Doe", &[]).await.unwrap();

        let region = placement.region;
        assert_eq!(region.strategy, Strategy::OcrDetected);
        assert_eq!(region.confidence, 92.0);
        assert!((region.x - 36.0).abs() < 1e-3);
        assert!((region.width - 108.0).abs() < 1e-3);
        assert!((region.y - (792.0 - 210.0 * 0.36)).abs() < 1e-3);

        let instruction = placement.instruction;
        assert!((instruction.x - 150.0).abs() < 1e-3);
        assert_eq!(instruction.y, region.y);
        assert_eq!(instruction.font_size, 12.0);

        let dir = rasterizer.last_dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists(), "raster directory should be removed");
    }

    #[tokio::test]
    async fn test_no_words_falls_back_to_common_position() {
        let locator = locator(
            LocatorConfig::default(),
            Arc::new(FakeRasterizer::letter()),
            FakeOcr::Words(Vec::new()),
        );
        let placement = locator.locate(&letter_pdf(), 0, "Jane Doe", &[]).await.unwrap();
        assert_eq!(placement.region.strategy, Strategy::CommonPosition);
        assert_eq!(placement.region.confidence, 0.6);
        assert_eq!(placement.instruction.x, 612.0 * 0.25);
        assert_eq!(placement.instruction.y, 792.0 * 0.65);
    }

    #[tokio::test]
    async fn test_ocr_failure_uses_known_field_names() {
        let rasterizer = Arc::new(FakeRasterizer::letter());
        let locator = locator(LocatorConfig::default(), rasterizer.clone(), FakeOcr::Fails);
        let known = vec!["applicant_name".to_string()];
        let instruction = locator
            .locate_and_fit(&letter_pdf(), 0, "Jane Doe", &known)
            .await
            .unwrap();
        assert_eq!(instruction.x, 612.0 * 0.30);
        assert_eq!(instruction.y, 792.0 * 0.75);

        let dir = rasterizer.last_dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_timeout_behaves_like_no_match() {
        let config = LocatorConfig {
            ocr_timeout_ms: Some(50),
            ..LocatorConfig::default()
        };
        let rasterizer = Arc::new(FakeRasterizer::letter());
        let locator = locator(config, rasterizer.clone(), FakeOcr::Hangs);
        let placement = locator.locate(&letter_pdf(), 0, "Jane", &[]).await.unwrap();
        assert_eq!(placement.region.strategy, Strategy::CommonPosition);

        let dir = rasterizer.last_dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_rasterization_error_propagates() {
        let locator = locator(
            LocatorConfig::default(),
            Arc::new(BrokenRasterizer),
            FakeOcr::Words(name_form_words()),
        );
        let err = locator.locate(&letter_pdf(), 0, "Jane", &[]).await.unwrap_err();
        assert!(matches!(err, FillError::Rasterization(_)));
    }

    #[tokio::test]
    async fn test_unreadable_document_has_no_insertion_point() {
        let locator = locator(
            LocatorConfig::default(),
            Arc::new(FakeRasterizer::letter()),
            FakeOcr::Words(Vec::new()),
        );
        let err = locator.locate(b"not a pdf", 0, "Jane", &[]).await.unwrap_err();
        assert!(matches!(err, FillError::NoInsertionPoint(_)));
        let err = locator.locate(&letter_pdf(), 4, "Jane", &[]).await.unwrap_err();
        assert!(matches!(err, FillError::NoInsertionPoint(_)));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let locator = locator(
            LocatorConfig::default(),
            Arc::new(FakeRasterizer::letter()),
            FakeOcr::Words(name_form_words()),
        );
        let pdf = letter_pdf();
        let first = locator.locate(&pdf, 0, "Jane Doe", &[]).await.unwrap();
        let second = locator.locate(&pdf, 0, "Jane Doe", &[]).await.unwrap();
        assert_eq!(first, second);
    }
}

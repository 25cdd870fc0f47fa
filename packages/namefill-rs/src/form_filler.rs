//! Puts a name into a PDF: the form's name field, filled and flattened, when
//! the document has one, otherwise text stamped where the locator says.
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FillError, Result};
use crate::layout_fitter::FitLimits;
use crate::locator::{Locator, Placement};
use crate::pdf_form::{field_names, fill_name_field};
use crate::pdf_page::{draw_text, load_document, page_size, save_document};

/// How the text ended up in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FillMethod {
    FormField { field: String },
    Stamped(Placement),
}

#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub method: FillMethod,
    pub pdf: Vec<u8>,
}

pub struct FormFiller {
    locator: Locator,
}

impl FormFiller {
    pub fn new(locator: Locator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Like [`Locator::locate`], but a page that cannot be rendered still gets
    /// a heuristic position instead of an error.
    pub async fn locate(&self, document: &[u8], page_index: usize, text: &str) -> Result<Placement> {
        let doc = load_document(document)
            .map_err(|e| FillError::NoInsertionPoint(format!("unreadable document: {e}")))?;
        let page = page_size(&doc, page_index)?;
        let known = field_names(&doc);
        drop(doc);

        match self
            .locator
            .locate_on_page(document, page_index, page, text, &known)
            .await
        {
            Err(FillError::Rasterization(reason)) => {
                warn!(%reason, "page could not be rasterized, placing without ocr");
                self.locator.place(None, page, text, &known)
            }
            other => other,
        }
    }

    /// Fills `text` into the document and returns the new PDF bytes.
    pub async fn fill(&self, document: &[u8], page_index: usize, text: &str) -> Result<FillOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FillError::Config("no name provided".into()));
        }

        let mut doc = load_document(document)?;
        let limits = FitLimits::from(self.locator.config());
        if let Some(field) = fill_name_field(&mut doc, text, &limits)? {
            return Ok(FillOutcome {
                method: FillMethod::FormField { field },
                pdf: save_document(&mut doc)?,
            });
        }
        info!("no fillable name field, locating the blank on the page");

        let placement = self.locate(document, page_index, text).await?;
        draw_text(&mut doc, page_index, &placement.instruction)?;
        Ok(FillOutcome {
            method: FillMethod::Stamped(placement),
            pdf: save_document(&mut doc)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocatorConfig;
    use crate::field_region::Strategy;
    use crate::locator::tests::{name_form_words, FakeOcr, FakeRasterizer};
    use crate::pdf_form::form_fields;
    use crate::pdf_form::tests::with_fields;
    use crate::pdf_page::tests::blank_document;
    use crate::pdf_page::page_id;
    use crate::rasterizer::{RasterPage, Rasterizer};
    use crate::text_measure::Helvetica;
    use async_trait::async_trait;
    use lopdf::content::Content;
    use std::sync::Arc;

    struct NoRenderer;

    #[async_trait]
    impl Rasterizer for NoRenderer {
        async fn rasterize(&self, _document: &[u8], _page_index: usize) -> Result<RasterPage> {
            Err(FillError::Rasterization("pdftoppm missing".into()))
        }
    }

    fn filler(rasterizer: Arc<dyn Rasterizer>, ocr: FakeOcr) -> FormFiller {
        FormFiller::new(Locator::with_collaborators(
            LocatorConfig::default(),
            rasterizer,
            Arc::new(ocr),
            Arc::new(Helvetica),
        ))
    }

    #[tokio::test]
    async fn test_form_field_is_preferred() {
        let mut doc = blank_document(612, 792, 1);
        with_fields(&mut doc, &[("full_name", "Tx")]);
        let pdf = save_document(&mut doc).unwrap();

        let outcome = filler(Arc::new(NoRenderer), FakeOcr::Fails)
            .fill(&pdf, 0, "Jane Doe")
            .await
            .unwrap();
        assert_eq!(
            outcome.method,
            FillMethod::FormField {
                field: "full_name".into()
            }
        );
        let filled = load_document(&outcome.pdf).unwrap();
        assert!(form_fields(&filled).is_empty());
        let content = filled.get_page_content(page_id(&filled, 0).unwrap()).unwrap();
        let shown: Vec<Vec<u8>> = Content::decode(&content)
            .unwrap()
            .operations
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .map(|op| op.operands[0].as_str().unwrap().to_vec())
            .collect();
        assert_eq!(shown, vec![b"Jane Doe".to_vec()]);
    }

    #[tokio::test]
    async fn test_flat_page_is_stamped_at_detected_label() {
        let pdf = save_document(&mut blank_document(612, 792, 1)).unwrap();
        let outcome = filler(
            Arc::new(FakeRasterizer::letter()),
            FakeOcr::Words(name_form_words()),
        )
        .fill(&pdf, 0, "  Jane Doe ")
        .await
        .unwrap();

        let FillMethod::Stamped(placement) = &outcome.method else {
            panic!("expected stamped text, got {:?}", outcome.method);
        };
        assert_eq!(placement.region.strategy, Strategy::OcrDetected);
        assert_eq!(placement.instruction.text, "Jane Doe");

        let filled = load_document(&outcome.pdf).unwrap();
        let content = filled.get_page_content(page_id(&filled, 0).unwrap()).unwrap();
        let ops = Content::decode(&content).unwrap().operations;
        assert!(ops.iter().any(|op| op.operator == "Tj"));
    }

    #[tokio::test]
    async fn test_rasterization_failure_degrades_to_known_fields() {
        let mut doc = blank_document(612, 792, 1);
        with_fields(&mut doc, &[("FullName", "Btn")]);
        let pdf = save_document(&mut doc).unwrap();

        let outcome = filler(Arc::new(NoRenderer), FakeOcr::Fails)
            .fill(&pdf, 0, "Jane")
            .await
            .unwrap();
        let FillMethod::Stamped(placement) = outcome.method else {
            panic!("expected stamped text");
        };
        assert_eq!(placement.region.strategy, Strategy::NameFieldDetected);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let pdf = save_document(&mut blank_document(612, 792, 1)).unwrap();
        let err = filler(Arc::new(NoRenderer), FakeOcr::Fails)
            .fill(&pdf, 0, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, FillError::Config(_)));
    }
}

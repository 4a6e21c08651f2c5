//! # Page Writer
//!
//! Assembles page bitmaps into a multi-page document and saves it.
//!
//! Placement coordinates are millimetres from the top-left corner of the page.
//! [`PdfPageWriter`] converts them to PDF user space, whose origin is the
//! bottom-left corner.
//!
//! `printpdf` documents are reference counted and not `Send`, so a writer
//! stays on the exporting task. Serialization happens there in memory; the
//! file write goes through `tokio::fs` and runs on the blocking pool.

use std::io::BufWriter;
use std::path::Path;

use async_trait::async_trait;
use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerIndex, PdfLayerReference, PdfPageIndex, Px,
};
use tracing::{debug, info, warn};

use crate::error::{ExportError, ExportResult};
use crate::geometry::PageGeometry;
use crate::paginate::Placement;

/// Resolution at which bitmaps are embedded before scaling to their placement.
const EMBED_DPI: f32 = 300.0;

const MM_PER_INCH: f32 = 25.4;

const LAYER_NAME: &str = "Layer 1";

/// Destination for paginated bitmaps.
///
/// Writers are driven from the exporting task and need not be `Send`.
#[async_trait(?Send)]
pub trait PageWriter {
    /// Starts a new page; following placements go on it.
    fn add_page(&mut self) -> ExportResult<()>;

    /// Draws `bitmap` on the current page, scaled to fill `placement`.
    fn place_image(&mut self, bitmap: &RgbImage, placement: &Placement) -> ExportResult<()>;

    /// Writes the finished document to `path`.
    ///
    /// Returns only once the bytes have reached the file, so a failed write
    /// is a `WriteFailure` and never a silent success.
    async fn save(&mut self, path: &Path) -> ExportResult<()>;

    /// Pages started so far.
    fn page_count(&self) -> usize;
}

// =============================================================================
// PDF
// =============================================================================

/// [`PageWriter`] producing a PDF with `printpdf`.
pub struct PdfPageWriter {
    geometry: PageGeometry,
    document: Option<PdfDocumentReference>,
    /// Page created together with the document, used by the first `add_page`.
    initial: Option<(PdfPageIndex, PdfLayerIndex)>,
    current: Option<PdfLayerReference>,
    pages: usize,
}

impl PdfPageWriter {
    pub fn new(geometry: &PageGeometry, title: &str) -> Self {
        let (document, page, layer) = PdfDocument::new(
            title,
            Mm(geometry.width_mm as f32),
            Mm(geometry.height_mm as f32),
            LAYER_NAME,
        );

        PdfPageWriter {
            geometry: *geometry,
            document: Some(document),
            initial: Some((page, layer)),
            current: None,
            pages: 0,
        }
    }

    fn document(&self) -> ExportResult<&PdfDocumentReference> {
        self.document
            .as_ref()
            .ok_or_else(|| ExportError::WriteFailure("document was already saved".to_string()))
    }
}

#[async_trait(?Send)]
impl PageWriter for PdfPageWriter {
    fn add_page(&mut self) -> ExportResult<()> {
        let initial = self.initial.take();
        let document = self.document()?;

        let layer = match initial {
            Some((page, layer)) => document.get_page(page).get_layer(layer),
            None => {
                let (page, layer) = document.add_page(
                    Mm(self.geometry.width_mm as f32),
                    Mm(self.geometry.height_mm as f32),
                    LAYER_NAME,
                );
                document.get_page(page).get_layer(layer)
            }
        };

        self.current = Some(layer);
        self.pages += 1;
        debug!(page = self.pages, "Page started");
        Ok(())
    }

    fn place_image(&mut self, bitmap: &RgbImage, placement: &Placement) -> ExportResult<()> {
        let layer = self
            .current
            .clone()
            .ok_or_else(|| ExportError::WriteFailure("no page started".to_string()))?;

        let (width_px, height_px) = bitmap.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(ExportError::WriteFailure(
                "cannot place an empty bitmap".to_string(),
            ));
        }

        let image = Image::from(ImageXObject {
            width: Px(width_px as usize),
            height: Px(height_px as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: bitmap.as_raw().clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // Natural size at EMBED_DPI, then stretched onto the placement box.
        let natural_width_mm = width_px as f32 * MM_PER_INCH / EMBED_DPI;
        let natural_height_mm = height_px as f32 * MM_PER_INCH / EMBED_DPI;
        let bottom_mm = self.geometry.height_mm - placement.y_mm - placement.height_mm;

        image.add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(placement.x_mm as f32)),
                translate_y: Some(Mm(bottom_mm as f32)),
                scale_x: Some(placement.width_mm as f32 / natural_width_mm),
                scale_y: Some(placement.height_mm as f32 / natural_height_mm),
                dpi: Some(EMBED_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn save(&mut self, path: &Path) -> ExportResult<()> {
        if self.pages == 0 {
            return Err(ExportError::WriteFailure(
                "document has no pages".to_string(),
            ));
        }
        let document = self
            .document
            .take()
            .ok_or_else(|| ExportError::WriteFailure("document was already saved".to_string()))?;

        let bytes = serialize(document)?;
        write_document(path, &bytes).await?;

        info!(path = %path.display(), pages = self.pages, bytes = bytes.len(), "Document saved");
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages
    }
}

/// Serializes the whole document into memory.
fn serialize(document: PdfDocumentReference) -> ExportResult<Vec<u8>> {
    let mut buffer = BufWriter::new(Vec::new());
    document
        .save(&mut buffer)
        .map_err(|e| ExportError::WriteFailure(format!("cannot serialize document: {}", e)))?;
    buffer
        .into_inner()
        .map_err(|e| ExportError::WriteFailure(format!("cannot serialize document: {}", e.error())))
}

/// Writes `bytes` to `path`.
///
/// On failure a partially written regular file is removed. Other targets,
/// such as device nodes, are left alone.
pub async fn write_document(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let Err(e) = tokio::fs::write(path, bytes).await else {
        return Ok(());
    };

    let partial = tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if partial {
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %remove_err, "Could not remove partial file");
        }
    }

    Err(ExportError::WriteFailure(format!(
        "cannot write '{}': {}",
        path.display(),
        e
    )))
}

//! # Export Command
//!
//! Exports a rendered quotation to a paginated PDF.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DocumentState ──snapshot──► reject NaN/∞ ──► filename                  │
//! │                                                 │                       │
//! │  --surface rendered.png ──► ImageFileSurface    │                       │
//! │                                   │             ▼                       │
//! │  ConfigState ──► geometry, capture options ──► ExportPipeline          │
//! │                                                 │                       │
//! │                                                 ▼                       │
//! │                                   <output dir>/<filename>.pdf          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use quote_core::validation::check_finite_inputs;
use quote_export::{
    ExportPipeline, ExportReport, FlattenCapture, ImageFileSurface, PdfPageWriter, RenderSurface,
};

use crate::error::ApiError;
use crate::state::{ConfigState, DocumentState};

/// Exports the rendering at `surface` for the current document.
///
/// `filename` defaults to `<prefix>-<quotation id>.pdf`.
pub async fn export_document(
    doc: &DocumentState,
    config: &ConfigState,
    surface: &Path,
    filename: Option<String>,
) -> Result<ExportReport, ApiError> {
    let snapshot = doc.snapshot();
    check_finite_inputs(&snapshot)?;
    if !snapshot.totals_are_current() {
        warn!(
            quotation_id = %snapshot.quotation_id,
            "Stored totals are stale; the rendering may not match the document"
        );
    }

    let filename = filename.unwrap_or_else(|| config.export_filename(&snapshot.quotation_id));
    let geometry = config.geometry();
    let capture = FlattenCapture::new(config.capture_options()?);

    let pipeline = ExportPipeline::new(geometry, Arc::new(capture), &config.output.directory)?
        .with_background(config.background()?);
    let surface: Arc<dyn RenderSurface> = Arc::new(ImageFileSurface::new(surface));
    let mut writer = PdfPageWriter::new(&geometry, &snapshot.quotation_name);

    let report = pipeline.export(surface, &mut writer, &filename).await?;
    info!(
        path = %report.path.display(),
        pages = report.pages_written,
        "export_document command finished"
    );
    Ok(report)
}

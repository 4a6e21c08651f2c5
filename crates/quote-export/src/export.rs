//! # Export Pipeline
//!
//! Drives capture, pagination and writing as one sequential state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──► Capturing ──► Paginating ──► Writing ──► Done                │
//! │    ▲           │                           │          │                 │
//! │    │           ▼                           ▼          │                 │
//! │    │         Failed ◄──────────────────────┘          │                 │
//! │    │           │                                      │                 │
//! │    └───────────┴──────── next export ─────────────────┘                 │
//! │                                                                         │
//! │  Capturing: await materialization, capture on the blocking pool,       │
//! │             plan the pages                                              │
//! │  Paginating: slice pages on the blocking pool; per-page problems are   │
//! │              degradations, never failures                               │
//! │  Writing:   add pages, place slices, save (file I/O on the blocking    │
//! │             pool; the writer itself stays on this task)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One export runs at a time per pipeline. A second call while one is in
//! flight returns [`ExportError::ExportInProgress`] without touching the state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use quote_core::validation::validate_export_filename;
use serde::Serialize;
use tracing::{info, warn};

use crate::capture::{CaptureService, RenderSurface};
use crate::error::{ExportError, ExportResult, PageExtractionDegraded};
use crate::geometry::PageGeometry;
use crate::paginate::{
    plan_pages, slice_pages, CopyRows, PagePlan, PaginationOutcome, RowExtractor, WHITE,
};
use crate::writer::PageWriter;

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportState {
    Idle,
    Capturing,
    Paginating,
    Writing,
    Done,
    Failed,
}

impl ExportState {
    /// Whether the pipeline may move from `self` to `next`.
    pub fn can_transition_to(self, next: ExportState) -> bool {
        use ExportState::*;
        matches!(
            (self, next),
            (Idle | Done | Failed, Capturing)
                | (Capturing, Paginating)
                | (Capturing, Failed)
                | (Paginating, Writing)
                | (Writing, Done)
                | (Writing, Failed)
        )
    }

    /// True once an export has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, ExportState::Done | ExportState::Failed)
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub path: PathBuf,
    pub planned_pages: usize,
    pub pages_written: usize,
    pub source_width_px: u32,
    pub source_height_px: u32,
    pub degradations: Vec<PageExtractionDegraded>,
    pub state: ExportState,
}

/// Holds the single-flight flag for the duration of one export.
struct ExportGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> ExportGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> ExportResult<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::ExportInProgress)?;
        Ok(ExportGuard { busy })
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct ExportPipeline {
    geometry: PageGeometry,
    background: Rgb<u8>,
    capture: Arc<dyn CaptureService>,
    extractor: Arc<dyn RowExtractor>,
    output_dir: PathBuf,
    busy: AtomicBool,
    state: Mutex<ExportState>,
}

impl ExportPipeline {
    /// Creates a pipeline writing into `output_dir`.
    ///
    /// ## Errors
    /// `InvalidGeometry` if the page leaves no content area.
    pub fn new(
        geometry: PageGeometry,
        capture: Arc<dyn CaptureService>,
        output_dir: impl Into<PathBuf>,
    ) -> ExportResult<Self> {
        geometry.validate()?;
        Ok(ExportPipeline {
            geometry,
            background: WHITE,
            capture,
            extractor: Arc::new(CopyRows),
            output_dir: output_dir.into(),
            busy: AtomicBool::new(false),
            state: Mutex::new(ExportState::Idle),
        })
    }

    /// Fill colour behind page slices.
    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        self.background = background;
        self
    }

    /// Replaces the default row extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn RowExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Current state.
    pub fn state(&self) -> ExportState {
        *self.state.lock().expect("Export state mutex poisoned")
    }

    /// True while an export is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Exports `surface` to `<output_dir>/<filename>`.
    ///
    /// `filename` gets a `.pdf` extension if it has none.
    ///
    /// ## Errors
    /// - `InvalidFilename` before anything starts
    /// - `ExportInProgress` if another export is running
    /// - `CaptureFailure` / `WriteFailure` (state ends in `Failed`)
    pub async fn export<W: PageWriter>(
        &self,
        surface: Arc<dyn RenderSurface>,
        writer: &mut W,
        filename: &str,
    ) -> ExportResult<ExportReport> {
        let filename = validate_export_filename(filename)?;
        let _guard = ExportGuard::acquire(&self.busy)?;

        info!(surface = surface.name(), filename = %filename, "Export started");

        self.transition(ExportState::Capturing);
        let (bitmap, plan) = match self.capture_stage(surface).await {
            Ok(captured) => captured,
            Err(e) => return Err(self.fail(e)),
        };
        let (source_width_px, source_height_px) = bitmap.dimensions();

        self.transition(ExportState::Paginating);
        let outcome = self.paginate_stage(bitmap, plan).await?;
        for degradation in outcome.degradations.iter().filter(|d| d.is_skipped()) {
            warn!(page = degradation.page, reason = %degradation.reason, "Page left out of export");
        }

        self.transition(ExportState::Writing);
        let path = self.output_dir.join(&filename);
        let pages_written = match self.write_stage(&outcome, writer, &path).await {
            Ok(pages) => pages,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(ExportState::Done);
        info!(
            path = %path.display(),
            pages = pages_written,
            degraded = outcome.degradations.len(),
            "Export finished"
        );

        Ok(ExportReport {
            path,
            planned_pages: outcome.plan.page_count(),
            pages_written,
            source_width_px,
            source_height_px,
            degradations: outcome.degradations,
            state: ExportState::Done,
        })
    }

    async fn capture_stage(
        &self,
        surface: Arc<dyn RenderSurface>,
    ) -> ExportResult<(RgbImage, PagePlan)> {
        surface.materialized().await?;

        let capture = Arc::clone(&self.capture);
        let bitmap = tokio::task::spawn_blocking(move || capture.capture(surface.as_ref()))
            .await
            .map_err(|e| ExportError::CaptureFailure(format!("capture task failed: {}", e)))??;

        let plan = plan_pages(bitmap.width(), bitmap.height(), &self.geometry)?;
        Ok((bitmap, plan))
    }

    async fn paginate_stage(
        &self,
        bitmap: RgbImage,
        plan: PagePlan,
    ) -> ExportResult<PaginationOutcome> {
        let geometry = self.geometry;
        let background = self.background;
        let extractor = Arc::clone(&self.extractor);

        let sliced = tokio::task::spawn_blocking(move || {
            slice_pages(&bitmap, plan, &geometry, background, extractor.as_ref())
        })
        .await;

        match sliced {
            Ok(outcome) => Ok(outcome),
            Err(e) => match e.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(e) => {
                    // Only happens while the runtime shuts down.
                    self.reset();
                    Err(ExportError::Interrupted(e.to_string()))
                }
            },
        }
    }

    async fn write_stage<W: PageWriter>(
        &self,
        outcome: &PaginationOutcome,
        writer: &mut W,
        path: &Path,
    ) -> ExportResult<usize> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                ExportError::WriteFailure(format!(
                    "cannot create '{}': {}",
                    self.output_dir.display(),
                    e
                ))
            })?;

        for page in &outcome.pages {
            writer.add_page()?;
            writer.place_image(&page.image, &page.placement)?;
        }
        writer.save(path).await?;
        Ok(outcome.pages.len())
    }

    fn transition(&self, next: ExportState) {
        let mut state = self.state.lock().expect("Export state mutex poisoned");
        debug_assert!(
            state.can_transition_to(next),
            "illegal export transition {:?} -> {:?}",
            *state,
            next
        );
        info!(from = ?*state, to = ?next, "Export state changed");
        *state = next;
    }

    fn fail(&self, error: ExportError) -> ExportError {
        warn!(error = %error, "Export failed");
        self.transition(ExportState::Failed);
        error
    }

    fn reset(&self) {
        *self.state.lock().expect("Export state mutex poisoned") = ExportState::Idle;
    }
}

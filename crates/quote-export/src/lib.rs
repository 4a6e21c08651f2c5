//! # quote-export: Pagination and Rasterization Engine
//!
//! Turns one tall rendered bitmap of a quotation into a multi-page document.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RenderSurface      CaptureService      paginate         PageWriter    │
//! │  ┌───────────┐      ┌───────────┐      ┌───────────┐    ┌───────────┐  │
//! │  │ rendered  │─────►│ flatten + │─────►│  slice    │───►│ add_page  │  │
//! │  │ document  │ RGBA │ resample  │ RGB  │ per page  │    │ place     │  │
//! │  └───────────┘      └───────────┘      └───────────┘    │ save      │  │
//! │                                                          └───────────┘  │
//! │                                                                         │
//! │  ExportPipeline owns the sequencing and the single-flight guard.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - Page size and margins
//! - [`paginate`] - Page planning and slicing (pure, synchronous)
//! - [`capture`] - Render surface and capture service traits
//! - [`writer`] - Page writer trait and the PDF implementation
//! - [`export`] - The export state machine
//! - [`error`] - Export errors and degradation records
//!
//! ## Example
//!
//! ```rust
//! use image::{Rgb, RgbImage};
//! use quote_export::{paginate, PageGeometry};
//!
//! // 380 px wide on A4 → 0.5 mm per pixel; 1200 px is 600 mm, three pages.
//! let source = RgbImage::from_pixel(380, 1200, Rgb([0, 0, 0]));
//! let outcome = paginate(&source, &PageGeometry::a4()).unwrap();
//! assert_eq!(outcome.pages.len(), 3);
//! ```

pub mod capture;
pub mod error;
pub mod export;
pub mod geometry;
pub mod paginate;
pub mod writer;

pub use capture::{
    CaptureOptions, CaptureService, FlattenCapture, ImageFileSurface, MemorySurface,
    RenderSurface, DEFAULT_CAPTURE_SCALE,
};
pub use error::{ExportError, ExportResult, PageExtractionDegraded, SliceError};
pub use export::{ExportPipeline, ExportReport, ExportState};
pub use geometry::{PageGeometry, PagePreset, DEFAULT_MARGIN_MM};
pub use paginate::{
    paginate, paginate_with, plan_pages, slice_pages, CopyRows, PagePlan, PageWindow,
    PaginationOutcome, Placement, RasterPage, RowExtractor, WHITE,
};
pub use writer::{write_document, PageWriter, PdfPageWriter};

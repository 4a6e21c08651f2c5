//! # Pagination
//!
//! Splits one tall source bitmap into page-sized slices.
//!
//! ## Coordinate Spaces
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  source pixels                 physical millimetres                     │
//! │  ─────────────                 ────────────────────                     │
//! │                                                                         │
//! │  W_px ────────── s = content_width / W_px ──────────► content_width    │
//! │  H_px ────────── × s ───────────────────────────────► H_mm             │
//! │                                                                         │
//! │  page p covers [p·ch, min((p+1)·ch, H_mm)) in mm                        │
//! │            and [⌊p·ch / s⌋, ⌊(p+1)·ch / s⌋) in rows                     │
//! │                                                                         │
//! │  Row boundaries are computed once per boundary and shared by the two   │
//! │  neighbouring pages, so no row is skipped or repeated.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scale `s` is fixed for the whole document. Pages are never rescaled
//! horizontally.
//!
//! ## Degradation
//! If extracting a page fails, the page is retried once with its rows clamped
//! to the source height. A page with no extractable rows is skipped. Either
//! case is recorded as [`PageExtractionDegraded`] and pagination goes on.

use std::ops::Range;

use image::{imageops, GenericImageView, Rgb, RgbImage};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ExportError, ExportResult, PageExtractionDegraded, SliceError};
use crate::geometry::PageGeometry;

/// Tolerance when converting millimetres back to rows.
const ROW_EPSILON: f64 = 1e-6;

/// Tolerance when counting pages, so an exact multiple of the page height
/// does not produce an empty trailing page.
const PAGE_COUNT_EPSILON: f64 = 1e-9;

/// Default fill behind every slice.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

// =============================================================================
// Plan
// =============================================================================

/// Where a slice goes on its page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// One planned page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    /// Zero-based page index.
    pub index: usize,
    /// Physical window start, measured from the top of the document.
    pub start_mm: f64,
    /// Physical window end (exclusive).
    pub end_mm: f64,
    /// Source rows covered by the window.
    pub rows: Range<u32>,
}

impl PageWindow {
    /// Physical height of the window.
    #[inline]
    pub fn height_mm(&self) -> f64 {
        self.end_mm - self.start_mm
    }
}

/// Page windows for one source bitmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    /// Millimetres per source pixel.
    pub scale: f64,
    /// Height of the whole document once scaled.
    pub document_height_mm: f64,
    /// Windows in top-to-bottom order.
    pub windows: Vec<PageWindow>,
}

impl PagePlan {
    /// Number of planned pages.
    pub fn page_count(&self) -> usize {
        self.windows.len()
    }

    /// True if the document fits on one page.
    pub fn is_single_page(&self) -> bool {
        self.windows.len() == 1
    }
}

/// Number of pages needed for a document of the given physical height.
///
/// Always at least 1.
pub fn page_count(document_height_mm: f64, content_height_mm: f64) -> usize {
    let pages = (document_height_mm / content_height_mm - PAGE_COUNT_EPSILON).ceil();
    pages.max(1.0) as usize
}

/// Plans the page windows for a `width_px × height_px` source.
///
/// ## Errors
/// - `CaptureFailure` if the source has zero area
/// - `InvalidGeometry` if the geometry has no content area
pub fn plan_pages(
    width_px: u32,
    height_px: u32,
    geometry: &PageGeometry,
) -> ExportResult<PagePlan> {
    if width_px == 0 || height_px == 0 {
        return Err(ExportError::CaptureFailure(format!(
            "source bitmap has zero area ({}×{} px)",
            width_px, height_px
        )));
    }
    geometry.validate()?;

    let scale = geometry.content_width() / width_px as f64;
    let document_height_mm = height_px as f64 * scale;
    let content_height = geometry.content_height();

    if document_height_mm <= content_height {
        return Ok(PagePlan {
            scale,
            document_height_mm,
            windows: vec![PageWindow {
                index: 0,
                start_mm: 0.0,
                end_mm: document_height_mm,
                rows: 0..height_px,
            }],
        });
    }

    let count = page_count(document_height_mm, content_height);
    let to_row = |mm: f64| -> u32 {
        let row = (mm / scale + ROW_EPSILON).floor();
        row.clamp(0.0, height_px as f64) as u32
    };

    let mut windows = Vec::with_capacity(count);
    let mut row_start = 0;
    for index in 0..count {
        let start_mm = index as f64 * content_height;
        let mut end_mm = ((index + 1) as f64 * content_height).min(document_height_mm);
        let mut row_end = if index + 1 == count {
            height_px
        } else {
            to_row(end_mm)
        };

        // Less than a pixel left over: this page takes the rest.
        let last = row_end >= height_px;
        if last {
            row_end = height_px;
            end_mm = document_height_mm;
        }

        windows.push(PageWindow {
            index,
            start_mm,
            end_mm,
            rows: row_start..row_end,
        });
        row_start = row_end;

        if last {
            break;
        }
    }

    Ok(PagePlan {
        scale,
        document_height_mm,
        windows,
    })
}

// =============================================================================
// Extraction
// =============================================================================

/// Copies a band of rows out of the source into a new page buffer.
///
/// Implementations must return a bitmap of the source width and exactly
/// `rows.len()` rows, or an error.
pub trait RowExtractor: Send + Sync {
    fn extract(
        &self,
        source: &RgbImage,
        rows: Range<u32>,
        background: Rgb<u8>,
    ) -> Result<RgbImage, SliceError>;
}

/// Default extractor: fills a new buffer with the background, then copies
/// the rows over it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyRows;

impl RowExtractor for CopyRows {
    fn extract(
        &self,
        source: &RgbImage,
        rows: Range<u32>,
        background: Rgb<u8>,
    ) -> Result<RgbImage, SliceError> {
        if rows.start >= rows.end || rows.end > source.height() {
            return Err(SliceError::OutOfBounds {
                start: rows.start,
                end: rows.end,
                height: source.height(),
            });
        }

        let width = source.width();
        let height = rows.end - rows.start;
        let mut page = RgbImage::from_pixel(width, height, background);
        let band = source.view(0, rows.start, width, height).to_image();
        imageops::replace(&mut page, &band, 0, 0);
        Ok(page)
    }
}

// =============================================================================
// Pages
// =============================================================================

/// One output page: its pixels and where they go.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// Index of the planned window this page came from.
    pub index: usize,
    /// Source rows actually on the page.
    pub rows: Range<u32>,
    /// Position and size on the physical page.
    pub placement: Placement,
    /// Page pixels, `rows.len()` high.
    pub image: RgbImage,
    /// True if the rows were clamped after a failed extraction.
    pub degraded: bool,
}

/// Result of paginating one source.
#[derive(Debug, Clone)]
pub struct PaginationOutcome {
    pub plan: PagePlan,
    pub pages: Vec<RasterPage>,
    pub degradations: Vec<PageExtractionDegraded>,
}

impl PaginationOutcome {
    /// Pages dropped because nothing could be extracted.
    pub fn skipped_pages(&self) -> usize {
        self.degradations.iter().filter(|d| d.is_skipped()).count()
    }
}

/// Paginates `source` onto pages of `geometry` with a white background.
///
/// ## Errors
/// Only for a zero-area source or an unusable geometry. Per-page problems
/// are absorbed and reported in [`PaginationOutcome::degradations`].
pub fn paginate(source: &RgbImage, geometry: &PageGeometry) -> ExportResult<PaginationOutcome> {
    paginate_with(source, geometry, WHITE, &CopyRows)
}

/// Paginates with an explicit background and extractor.
pub fn paginate_with(
    source: &RgbImage,
    geometry: &PageGeometry,
    background: Rgb<u8>,
    extractor: &dyn RowExtractor,
) -> ExportResult<PaginationOutcome> {
    let plan = plan_pages(source.width(), source.height(), geometry)?;
    Ok(slice_pages(source, plan, geometry, background, extractor))
}

/// Cuts the planned windows out of `source`.
///
/// `plan` may have been made for a different height than `source` has (for
/// example from dimensions reported before capture). Windows that reach past
/// the source are clamped, and windows entirely below it are skipped.
pub fn slice_pages(
    source: &RgbImage,
    plan: PagePlan,
    geometry: &PageGeometry,
    background: Rgb<u8>,
    extractor: &dyn RowExtractor,
) -> PaginationOutcome {
    debug!(
        width_px = source.width(),
        height_px = source.height(),
        scale = plan.scale,
        document_height_mm = plan.document_height_mm,
        pages = plan.page_count(),
        "Slicing source into pages"
    );

    let mut pages = Vec::with_capacity(plan.windows.len());
    let mut degradations = Vec::new();

    for window in &plan.windows {
        let placement = Placement {
            x_mm: geometry.margin_mm,
            y_mm: geometry.margin_mm,
            width_mm: geometry.content_width(),
            height_mm: window.height_mm(),
        };

        let first_error = match extractor.extract(source, window.rows.clone(), background) {
            Ok(image) => {
                debug!(
                    page = window.index,
                    start_px = window.rows.start,
                    end_px = window.rows.end,
                    "Page extracted"
                );
                pages.push(RasterPage {
                    index: window.index,
                    rows: window.rows.clone(),
                    placement,
                    image,
                    degraded: false,
                });
                continue;
            }
            Err(err) => err,
        };

        warn!(
            page = window.index,
            start_px = window.rows.start,
            end_px = window.rows.end,
            error = %first_error,
            "Page extraction failed, retrying with clamped rows"
        );

        let clamped = clamp_rows(&window.rows, source.height());
        let recovered = if clamped.is_empty() {
            None
        } else {
            match extractor.extract(source, clamped.clone(), background) {
                Ok(image) => Some((clamped, image)),
                Err(err) => {
                    warn!(page = window.index, error = %err, "Clamped extraction failed");
                    None
                }
            }
        };

        match recovered {
            Some((rows, image)) => {
                warn!(
                    page = window.index,
                    start_px = rows.start,
                    end_px = rows.end,
                    "Page degraded to clamped rows"
                );
                pages.push(RasterPage {
                    index: window.index,
                    placement: Placement {
                        height_mm: (rows.end - rows.start) as f64 * plan.scale,
                        ..placement
                    },
                    rows: rows.clone(),
                    image,
                    degraded: true,
                });
                degradations.push(PageExtractionDegraded {
                    page: window.index,
                    requested: window.rows.clone(),
                    recovered: Some(rows),
                    reason: first_error.to_string(),
                });
            }
            None => {
                warn!(page = window.index, "Page skipped, no extractable rows");
                degradations.push(PageExtractionDegraded {
                    page: window.index,
                    requested: window.rows.clone(),
                    recovered: None,
                    reason: first_error.to_string(),
                });
            }
        }
    }

    PaginationOutcome {
        plan,
        pages,
        degradations,
    }
}

fn clamp_rows(rows: &Range<u32>, height: u32) -> Range<u32> {
    let start = rows.start.min(height);
    let end = rows.end.min(height).max(start);
    start..end
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Source whose every row is filled with its row number (mod 256).
    fn striped(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |_, y| Rgb([(y % 256) as u8, 0, 0]))
    }

    /// Fails every extraction of exactly `rows`.
    struct FailRows(Range<u32>);

    impl RowExtractor for FailRows {
        fn extract(
            &self,
            source: &RgbImage,
            rows: Range<u32>,
            background: Rgb<u8>,
        ) -> Result<RgbImage, SliceError> {
            if rows == self.0 {
                Err(SliceError::Draw("simulated failure".to_string()))
            } else {
                CopyRows.extract(source, rows, background)
            }
        }
    }

    #[test]
    fn test_single_page_when_document_fits() {
        // 190 px wide on A4 → 1 mm per px; 200 mm tall fits in 277 mm.
        let outcome = paginate(&striped(190, 200), &PageGeometry::a4()).unwrap();

        assert_eq!(outcome.pages.len(), 1);
        let page = &outcome.pages[0];
        assert_eq!(page.rows, 0..200);
        assert_eq!(page.image.dimensions(), (190, 200));
        assert_eq!(
            page.placement,
            Placement {
                x_mm: 10.0,
                y_mm: 10.0,
                width_mm: 190.0,
                height_mm: 200.0,
            }
        );
    }

    #[test]
    fn test_exact_fit_is_one_page() {
        let plan = plan_pages(190, 277, &PageGeometry::a4()).unwrap();
        assert!(plan.is_single_page());
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_page() {
        let plan = plan_pages(190, 277 * 3, &PageGeometry::a4()).unwrap();
        assert_eq!(plan.page_count(), 3);
        let rows: Vec<Range<u32>> = plan.windows.iter().map(|w| w.rows.clone()).collect();
        assert_eq!(rows, vec![0..277, 277..554, 554..831]);
    }

    #[test]
    fn test_multi_page_windows() {
        // 380 px wide → 0.5 mm per px; 1200 px → 600 mm → 3 pages of 277 mm.
        let plan = plan_pages(380, 1200, &PageGeometry::a4()).unwrap();

        assert_eq!(plan.scale, 0.5);
        assert_eq!(plan.document_height_mm, 600.0);
        assert_eq!(plan.page_count(), 3);
        assert_eq!(plan.windows[0].rows, 0..554);
        assert_eq!(plan.windows[1].rows, 554..1108);
        assert_eq!(plan.windows[2].rows, 1108..1200);
        assert_eq!(plan.windows[2].start_mm, 554.0);
        assert_eq!(plan.windows[2].end_mm, 600.0);
    }

    #[test]
    fn test_slices_copy_the_right_rows() {
        let source = striped(380, 1200);
        let outcome = paginate(&source, &PageGeometry::a4()).unwrap();

        assert_eq!(outcome.pages.len(), 3);
        assert!(outcome.degradations.is_empty());

        let second = &outcome.pages[1];
        assert_eq!(second.image.dimensions(), (380, 554));
        // First row of page 2 is source row 554.
        assert_eq!(second.image.get_pixel(0, 0), source.get_pixel(0, 554));
        assert_eq!(second.image.get_pixel(379, 553), source.get_pixel(379, 1107));
        assert_eq!(second.placement.height_mm, 277.0);

        let last = &outcome.pages[2];
        assert_eq!(last.placement.height_mm, 46.0);
    }

    #[test]
    fn test_zero_area_is_capture_failure() {
        let err = paginate(&RgbImage::new(0, 10), &PageGeometry::a4()).unwrap_err();
        assert!(matches!(err, ExportError::CaptureFailure(_)));
        let err = paginate(&RgbImage::new(10, 0), &PageGeometry::a4()).unwrap_err();
        assert!(matches!(err, ExportError::CaptureFailure(_)));
    }

    #[test]
    fn test_invalid_geometry() {
        let err = paginate(&striped(10, 10), &PageGeometry::a4().with_margin(200.0)).unwrap_err();
        assert!(matches!(err, ExportError::InvalidGeometry(_)));
    }

    #[test]
    fn test_failed_page_is_skipped_not_fatal() {
        let source = striped(380, 1200);
        let outcome = paginate_with(
            &source,
            &PageGeometry::a4(),
            WHITE,
            &FailRows(554..1108),
        )
        .unwrap();

        assert_eq!(outcome.plan.page_count(), 3);
        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(outcome.skipped_pages(), 1);
        assert_eq!(outcome.degradations[0].page, 1);
        let indices: Vec<usize> = outcome.pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_plan_taller_than_source_is_clamped() {
        // Plan made for 1200 rows, but only 1000 were captured.
        let plan = plan_pages(380, 1200, &PageGeometry::a4()).unwrap();
        let source = striped(380, 1000);
        let outcome = slice_pages(&source, plan, &PageGeometry::a4(), WHITE, &CopyRows);

        assert_eq!(outcome.pages.len(), 2);
        let clamped = &outcome.pages[1];
        assert!(clamped.degraded);
        assert_eq!(clamped.rows, 554..1000);
        assert_eq!(clamped.image.height(), 446);
        assert_eq!(clamped.placement.height_mm, 223.0);

        assert_eq!(outcome.degradations.len(), 2);
        assert_eq!(outcome.degradations[0].recovered, Some(554..1000));
        assert!(outcome.degradations[1].is_skipped());
    }

    #[test]
    fn test_background_fill_under_slice() {
        let page = CopyRows
            .extract(&striped(4, 4), 1..3, Rgb([9, 9, 9]))
            .unwrap();
        assert_eq!(page.dimensions(), (4, 2));
        assert_eq!(page.get_pixel(0, 0), &Rgb([1, 0, 0]));
    }

    #[test]
    fn test_copy_rows_rejects_bad_ranges() {
        let source = striped(4, 4);
        assert!(CopyRows.extract(&source, 2..2, WHITE).is_err());
        assert!(CopyRows.extract(&source, 3..5, WHITE).is_err());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0.0, 277.0), 1);
        assert_eq!(page_count(277.0, 277.0), 1);
        assert_eq!(page_count(277.5, 277.0), 2);
        assert_eq!(page_count(831.0, 277.0), 3);
    }

    proptest! {
        #[test]
        fn prop_windows_cover_source_exactly(
            width in 1u32..4000,
            height in 1u32..40000,
            margin in 0.0..40.0f64,
        ) {
            let geometry = PageGeometry::a4().with_margin(margin);
            let plan = plan_pages(width, height, &geometry).unwrap();

            prop_assert_eq!(plan.windows[0].rows.start, 0);
            prop_assert_eq!(plan.windows.last().unwrap().rows.end, height);
            for pair in plan.windows.windows(2) {
                prop_assert_eq!(pair[0].rows.end, pair[1].rows.start);
                prop_assert!(pair[0].rows.start <= pair[0].rows.end);
            }

            let ratio = height as f64 * plan.scale / geometry.content_height();
            let expected = ratio.ceil().max(1.0) as usize;
            prop_assert!(
                plan.page_count() == expected || (ratio - ratio.round()).abs() < 1e-6,
                "pages {} expected {}", plan.page_count(), expected
            );
        }

        #[test]
        fn prop_row_windows_track_physical_windows(
            width in 1u32..4000,
            height in 1u32..40000,
        ) {
            let plan = plan_pages(width, height, &PageGeometry::a4()).unwrap();
            for window in &plan.windows {
                let start_rows_mm = window.rows.start as f64 * plan.scale;
                prop_assert!((start_rows_mm - window.start_mm).abs() < plan.scale + 1e-9);
            }
        }

        #[test]
        fn prop_failure_never_adds_pages(height in 300u32..3000, fail_page in 0usize..10) {
            let source = striped(190, height);
            let plan = plan_pages(190, height, &PageGeometry::a4()).unwrap();
            let target = plan
                .windows
                .get(fail_page % plan.page_count())
                .map(|w| w.rows.clone())
                .unwrap();

            let outcome = paginate_with(&source, &PageGeometry::a4(), WHITE, &FailRows(target)).unwrap();
            prop_assert!(outcome.pages.len() <= plan.page_count());
            prop_assert_eq!(outcome.pages.len() + outcome.skipped_pages(), plan.page_count());
        }
    }
}

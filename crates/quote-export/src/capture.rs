//! # Capture
//!
//! Turns a rendered surface into one opaque RGB bitmap.
//!
//! The surface itself (an HTML renderer, a headless browser, a pre-rendered
//! image) lives outside this crate. It only has to report when it is fully
//! materialized and hand over its RGBA pixels.
//!
//! ```text
//! RenderSurface ──materialized().await──► draw() ──► RGBA
//!                                                     │
//!                      FlattenCapture: resample × scale, flatten alpha
//!                                                     ▼
//!                                                    RGB
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use image::{imageops, imageops::FilterType, Rgb, RgbImage, RgbaImage};
use tracing::{debug, info};

use crate::error::{ExportError, ExportResult};
use crate::paginate::WHITE;

/// Capture resolution multiplier used unless configured otherwise.
pub const DEFAULT_CAPTURE_SCALE: f32 = 2.0;

// =============================================================================
// Traits
// =============================================================================

/// A rendered view of the document.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Resolves once every embedded image (logo, signature) is loaded.
    async fn materialized(&self) -> ExportResult<()>;

    /// Current pixels of the surface.
    fn draw(&self) -> ExportResult<RgbaImage>;
}

/// Produces the source bitmap for pagination.
///
/// Called on the blocking pool, after the surface reports it is materialized.
pub trait CaptureService: Send + Sync {
    fn capture(&self, surface: &dyn RenderSurface) -> ExportResult<RgbImage>;
}

// =============================================================================
// FlattenCapture
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Resolution multiplier applied to the surface pixels.
    pub scale: f32,
    /// Colour behind transparent pixels.
    pub background: Rgb<u8>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        CaptureOptions {
            scale: DEFAULT_CAPTURE_SCALE,
            background: WHITE,
        }
    }
}

/// Resamples the surface and flattens it over a solid background.
#[derive(Debug, Clone, Default)]
pub struct FlattenCapture {
    options: CaptureOptions,
}

impl FlattenCapture {
    pub fn new(options: CaptureOptions) -> Self {
        FlattenCapture { options }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }
}

impl CaptureService for FlattenCapture {
    fn capture(&self, surface: &dyn RenderSurface) -> ExportResult<RgbImage> {
        let scale = self.options.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ExportError::CaptureFailure(format!(
                "capture scale must be a positive number, got {}",
                scale
            )));
        }

        let pixels = surface.draw()?;
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(ExportError::CaptureFailure(format!(
                "surface '{}' rendered a zero-area bitmap ({}×{} px)",
                surface.name(),
                width,
                height
            )));
        }

        let pixels = if (scale - 1.0).abs() > f32::EPSILON {
            let scaled_width = scaled_dimension(width, scale);
            let scaled_height = scaled_dimension(height, scale);
            debug!(
                surface = surface.name(),
                width, height, scaled_width, scaled_height, "Resampling surface"
            );
            imageops::resize(&pixels, scaled_width, scaled_height, FilterType::Triangle)
        } else {
            pixels
        };

        let bitmap = flatten(&pixels, self.options.background);
        info!(
            surface = surface.name(),
            width_px = bitmap.width(),
            height_px = bitmap.height(),
            "Surface captured"
        );
        Ok(bitmap)
    }
}

fn scaled_dimension(value: u32, scale: f32) -> u32 {
    ((value as f32 * scale).round() as u32).max(1)
}

/// Alpha-blends every pixel over `background`.
pub fn flatten(pixels: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0;
        let blend = |fg: u8, bg: u8| -> u8 {
            let a = a as u32;
            ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
        };
        Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

// =============================================================================
// Surfaces
// =============================================================================

/// A surface that is already in memory.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    name: String,
    pixels: RgbaImage,
}

impl MemorySurface {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        MemorySurface {
            name: name.into(),
            pixels,
        }
    }
}

#[async_trait]
impl RenderSurface for MemorySurface {
    fn name(&self) -> &str {
        &self.name
    }

    async fn materialized(&self) -> ExportResult<()> {
        Ok(())
    }

    fn draw(&self) -> ExportResult<RgbaImage> {
        Ok(self.pixels.clone())
    }
}

/// A PNG or JPEG rendering of the document on disk.
///
/// Loading the file is the materialization step.
#[derive(Debug)]
pub struct ImageFileSurface {
    path: PathBuf,
    name: String,
    pixels: OnceLock<RgbaImage>,
}

impl ImageFileSurface {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        ImageFileSurface {
            path,
            name,
            pixels: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RenderSurface for ImageFileSurface {
    fn name(&self) -> &str {
        &self.name
    }

    async fn materialized(&self) -> ExportResult<()> {
        if self.pixels.get().is_some() {
            return Ok(());
        }

        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            ExportError::CaptureFailure(format!("cannot read '{}': {}", self.name, e))
        })?;
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| ExportError::CaptureFailure(format!("decoder task failed: {}", e)))?
            .map_err(|e| {
                ExportError::CaptureFailure(format!("cannot decode '{}': {}", self.name, e))
            })?;

        let pixels = decoded.to_rgba8();
        debug!(
            surface = %self.name,
            width = pixels.width(),
            height = pixels.height(),
            "Surface materialized"
        );
        // A concurrent materialization may have won; either copy is the same file.
        let _ = self.pixels.set(pixels);
        Ok(())
    }

    fn draw(&self) -> ExportResult<RgbaImage> {
        self.pixels.get().cloned().ok_or_else(|| {
            ExportError::CaptureFailure(format!(
                "surface '{}' was drawn before it was materialized",
                self.name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, pixel: Rgba<u8>) -> MemorySurface {
        MemorySurface::new("test", RgbaImage::from_pixel(width, height, pixel))
    }

    #[test]
    fn test_flatten_blends_alpha() {
        let pixels = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([0, 0, 0, 255]),
            1 => Rgba([0, 0, 0, 0]),
            _ => Rgba([0, 0, 0, 128]),
        });
        let flat = flatten(&pixels, WHITE);

        assert_eq!(flat.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(2, 0), &Rgb([127, 127, 127]));
    }

    #[test]
    fn test_capture_applies_scale() {
        let capture = FlattenCapture::default();
        let bitmap = capture.capture(&solid(10, 25, Rgba([1, 2, 3, 255]))).unwrap();
        assert_eq!(bitmap.dimensions(), (20, 50));
        assert_eq!(bitmap.get_pixel(5, 5), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_capture_at_unit_scale_keeps_size() {
        let capture = FlattenCapture::new(CaptureOptions {
            scale: 1.0,
            ..Default::default()
        });
        let bitmap = capture.capture(&solid(7, 9, Rgba([0, 0, 0, 0]))).unwrap();
        assert_eq!(bitmap.dimensions(), (7, 9));
        assert_eq!(bitmap.get_pixel(0, 0), &WHITE);
    }

    #[test]
    fn test_zero_area_surface_fails() {
        let err = FlattenCapture::default()
            .capture(&solid(10, 0, Rgba([0, 0, 0, 255])))
            .unwrap_err();
        assert!(matches!(err, ExportError::CaptureFailure(_)));
    }

    #[test]
    fn test_bad_scale_fails() {
        let capture = FlattenCapture::new(CaptureOptions {
            scale: 0.0,
            ..Default::default()
        });
        assert!(capture.capture(&solid(1, 1, Rgba([0, 0, 0, 255]))).is_err());
    }

    #[tokio::test]
    async fn test_image_file_surface_loads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rendered.png");
        RgbaImage::from_pixel(4, 6, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let surface = ImageFileSurface::new(&path);
        assert!(surface.draw().is_err());

        surface.materialized().await.unwrap();
        let pixels = surface.draw().unwrap();
        assert_eq!(pixels.dimensions(), (4, 6));
        assert_eq!(pixels.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[tokio::test]
    async fn test_missing_file_is_capture_failure() {
        let surface = ImageFileSurface::new("/nonexistent/rendered.png");
        let err = surface.materialized().await.unwrap_err();
        assert!(matches!(err, ExportError::CaptureFailure(_)));
    }
}

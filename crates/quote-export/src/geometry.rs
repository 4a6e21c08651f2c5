//! # Page Geometry
//!
//! Physical page size and margins, in millimetres.
//!
//! ```text
//! ┌──────────────── width_mm ────────────────┐
//! │ margin                                    │
//! │   ┌──────── content_width ──────────┐     │
//! │   │                                 │     │
//! │   │                          content_height
//! │   │                                 │     │
//! │   └─────────────────────────────────┘     │
//! │                                    margin │
//! └───────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};

/// Margin applied on every side by default.
pub const DEFAULT_MARGIN_MM: f64 = 10.0;

/// Page size and uniform margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl PageGeometry {
    /// Creates a geometry from explicit dimensions.
    pub const fn new(width_mm: f64, height_mm: f64, margin_mm: f64) -> Self {
        PageGeometry {
            width_mm,
            height_mm,
            margin_mm,
        }
    }

    /// A4 portrait (210 × 297 mm) with 10 mm margins.
    pub const fn a4() -> Self {
        PageGeometry::new(210.0, 297.0, DEFAULT_MARGIN_MM)
    }

    /// US Letter portrait (215.9 × 279.4 mm) with 10 mm margins.
    pub const fn letter() -> Self {
        PageGeometry::new(215.9, 279.4, DEFAULT_MARGIN_MM)
    }

    /// Returns the same page with a different margin.
    pub const fn with_margin(self, margin_mm: f64) -> Self {
        PageGeometry::new(self.width_mm, self.height_mm, margin_mm)
    }

    /// Usable width: page width minus both side margins.
    #[inline]
    pub fn content_width(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    /// Usable height: page height minus top and bottom margins.
    #[inline]
    pub fn content_height(&self) -> f64 {
        self.height_mm - 2.0 * self.margin_mm
    }

    /// Checks that every dimension is finite and the content area is non-empty.
    pub fn validate(&self) -> ExportResult<()> {
        let values = [self.width_mm, self.height_mm, self.margin_mm];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ExportError::InvalidGeometry(
                "dimensions must be finite numbers".to_string(),
            ));
        }
        if self.margin_mm < 0.0 {
            return Err(ExportError::InvalidGeometry(
                "margin must not be negative".to_string(),
            ));
        }
        if self.content_width() <= 0.0 || self.content_height() <= 0.0 {
            return Err(ExportError::InvalidGeometry(format!(
                "{}×{} mm page with {} mm margins has no content area",
                self.width_mm, self.height_mm, self.margin_mm
            )));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::a4()
    }
}

/// Named page sizes accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagePreset {
    #[default]
    A4,
    Letter,
}

impl PagePreset {
    /// Geometry for this preset with the given margin.
    pub fn geometry(self, margin_mm: f64) -> PageGeometry {
        match self {
            PagePreset::A4 => PageGeometry::a4(),
            PagePreset::Letter => PageGeometry::letter(),
        }
        .with_margin(margin_mm)
    }
}

impl fmt::Display for PagePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagePreset::A4 => write!(f, "a4"),
            PagePreset::Letter => write!(f, "letter"),
        }
    }
}

impl FromStr for PagePreset {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a4" => Ok(PagePreset::A4),
            "letter" => Ok(PagePreset::Letter),
            other => Err(ExportError::InvalidGeometry(format!(
                "unknown page preset '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_content_area() {
        let geometry = PageGeometry::a4();
        assert_eq!(geometry.content_width(), 190.0);
        assert_eq!(geometry.content_height(), 277.0);
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn test_margins_too_large() {
        let geometry = PageGeometry::a4().with_margin(105.0);
        assert!(matches!(
            geometry.validate(),
            Err(ExportError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_non_finite_dimensions() {
        let geometry = PageGeometry::new(f64::NAN, 297.0, 10.0);
        assert!(geometry.validate().is_err());
        assert!(PageGeometry::a4().with_margin(-1.0).validate().is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!("A4".parse::<PagePreset>().unwrap(), PagePreset::A4);
        assert_eq!(
            PagePreset::Letter.geometry(5.0),
            PageGeometry::new(215.9, 279.4, 5.0)
        );
        assert!("tabloid".parse::<PagePreset>().is_err());
    }
}

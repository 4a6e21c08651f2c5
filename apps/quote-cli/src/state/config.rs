//! # Configuration State
//!
//! Export settings loaded at startup.
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file (`--config <path>`, else `config.toml` in the platform
//!    config directory)
//! 3. Environment variables (`QUOTE_*`)
//!
//! ```toml
//! # config.toml
//! [page]
//! preset = "a4"
//! margin_mm = 10.0
//!
//! [capture]
//! scale = 2.0
//! background = "#ffffff"
//!
//! [output]
//! directory = "./quotations"
//! filename_prefix = "Quotation"
//! ```
//!
//! Read-only after loading, so no mutex.

use std::path::PathBuf;

use image::Rgb;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use quote_core::validation::{export_filename, DEFAULT_EXPORT_PREFIX};
use quote_export::{CaptureOptions, PageGeometry, PagePreset, DEFAULT_CAPTURE_SCALE, DEFAULT_MARGIN_MM};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    pub page: PageSettings,
    pub capture: CaptureSettings,
    pub output: OutputSettings,
}

/// Page size and margins.
///
/// `width_mm` and `height_mm` override the preset when both are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub preset: PagePreset,
    pub width_mm: Option<f64>,
    pub height_mm: Option<f64>,
    pub margin_mm: f64,
}

impl Default for PageSettings {
    fn default() -> Self {
        PageSettings {
            preset: PagePreset::A4,
            width_mm: None,
            height_mm: None,
            margin_mm: DEFAULT_MARGIN_MM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Resolution multiplier applied to the rendered surface.
    pub scale: f32,
    /// Background as `#rrggbb`.
    pub background: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            scale: DEFAULT_CAPTURE_SCALE,
            background: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub filename_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            directory: PathBuf::from("."),
            filename_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
        }
    }
}

impl ConfigState {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else if explicit {
                return Err(ApiError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Checks every setting the export pipeline depends on.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page.width_mm.is_some() != self.page.height_mm.is_some() {
            return Err(ApiError::config(
                "page.width_mm and page.height_mm must be set together",
            ));
        }
        self.geometry().validate()?;

        let scale = self.capture.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ApiError::config(format!(
                "capture.scale must be a positive number, got {}",
                scale
            )));
        }

        self.background()?;

        if self.output.filename_prefix.contains(['/', '\\']) {
            return Err(ApiError::config(
                "output.filename_prefix must not contain path separators",
            ));
        }

        Ok(())
    }

    /// Page geometry from the preset or explicit dimensions.
    pub fn geometry(&self) -> PageGeometry {
        match (self.page.width_mm, self.page.height_mm) {
            (Some(width), Some(height)) => PageGeometry::new(width, height, self.page.margin_mm),
            _ => self.page.preset.geometry(self.page.margin_mm),
        }
    }

    /// Parsed background colour.
    pub fn background(&self) -> Result<Rgb<u8>, ApiError> {
        parse_hex_color(&self.capture.background).ok_or_else(|| {
            ApiError::config(format!(
                "capture.background must look like #rrggbb, got '{}'",
                self.capture.background
            ))
        })
    }

    /// Capture options for the export pipeline.
    pub fn capture_options(&self) -> Result<CaptureOptions, ApiError> {
        Ok(CaptureOptions {
            scale: self.capture.scale,
            background: self.background()?,
        })
    }

    /// Export filename for a quotation id, using the configured prefix.
    pub fn export_filename(&self, quotation_id: &str) -> String {
        export_filename(&self.output.filename_prefix, quotation_id)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `QUOTE_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(preset) = lookup("QUOTE_PAGE_PRESET") {
            match preset.parse() {
                Ok(parsed) => {
                    debug!(preset = %preset, "Overriding page preset from environment");
                    self.page.preset = parsed;
                }
                Err(_) => warn!(preset = %preset, "Unknown page preset in environment"),
            }
        }

        if let Some(margin) = lookup("QUOTE_PAGE_MARGIN_MM") {
            match margin.parse::<f64>() {
                Ok(m) => self.page.margin_mm = m,
                Err(_) => warn!(margin = %margin, "Invalid page margin in environment"),
            }
        }

        if let Some(scale) = lookup("QUOTE_CAPTURE_SCALE") {
            match scale.parse::<f32>() {
                Ok(s) => {
                    debug!(scale = s, "Overriding capture scale from environment");
                    self.capture.scale = s;
                }
                Err(_) => warn!(scale = %scale, "Invalid capture scale in environment"),
            }
        }

        if let Some(background) = lookup("QUOTE_BACKGROUND") {
            self.capture.background = background;
        }

        if let Some(dir) = lookup("QUOTE_OUTPUT_DIR") {
            debug!(dir = %dir, "Overriding output directory from environment");
            self.output.directory = PathBuf::from(dir);
        }

        if let Some(prefix) = lookup("QUOTE_FILENAME_PREFIX") {
            self.output.filename_prefix = prefix;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "quotation", "studio")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Parses `#rrggbb` (the `#` is optional).
fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

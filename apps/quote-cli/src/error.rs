//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command Function ── Result<T, ApiError>                               │
//! │         │                                                               │
//! │         ├── CoreError::ItemNotFound ─────────► NOT_FOUND               │
//! │         ├── ValidationError ─────────────────► VALIDATION_ERROR        │
//! │         ├── ExportError::CaptureFailure ─────► CAPTURE_FAILED          │
//! │         ├── ExportError::WriteFailure ───────► WRITE_FAILED            │
//! │         ├── ExportError::ExportInProgress ───► EXPORT_IN_PROGRESS      │
//! │         └── config / io ─────────────────────► CONFIG_ERROR / IO_ERROR │
//! │                                                                         │
//! │  main() prints `[CODE] message` to stderr and exits non-zero.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use quote_core::{CoreError, ValidationError};
use quote_export::ExportError;

/// Error returned from CLI commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Line item not found: 7"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced line item does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Rendered surface could not be captured
    CaptureFailed,

    /// Output document could not be written
    WriteFailed,

    /// Another export is still running
    ExportInProgress,

    /// Configuration file or environment is invalid
    ConfigError,

    /// Reading an input file failed
    IoError,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ApiError::not_found("Line item", &id.to_string()),
            CoreError::InvalidDocument(reason) => {
                ApiError::validation(format!("Invalid document: {}", reason))
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts export errors to API errors.
impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::CaptureFailure(reason) => ApiError::new(
                ErrorCode::CaptureFailed,
                format!("Capture failed: {}", reason),
            ),
            ExportError::WriteFailure(reason) => ApiError::new(
                ErrorCode::WriteFailed,
                format!("Write failed: {}", reason),
            ),
            ExportError::ExportInProgress => ApiError::new(
                ErrorCode::ExportInProgress,
                "An export is already in progress",
            ),
            ExportError::InvalidGeometry(reason) => {
                ApiError::config(format!("Invalid page geometry: {}", reason))
            }
            ExportError::InvalidFilename(e) => ApiError::validation(e.to_string()),
            ExportError::Interrupted(reason) => {
                tracing::error!("Export interrupted: {}", reason);
                ApiError::internal("Export was interrupted")
            }
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid JSON: {}", err))
    }
}

impl From<toml::de::Error> for ApiError {
    fn from(err: toml::de::Error) -> Self {
        ApiError::config(format!("Invalid config file: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = serde_json::to_value(self.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.code));
        write!(f, "[{}] {}", code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::ItemNotFound(7).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Line item not found: 7");
    }

    #[test]
    fn test_export_error_mapping() {
        let err: ApiError = ExportError::CaptureFailure("zero area".into()).into();
        assert_eq!(err.code, ErrorCode::CaptureFailed);

        let err: ApiError = ExportError::ExportInProgress.into();
        assert_eq!(err.code, ErrorCode::ExportInProgress);
    }

    #[test]
    fn test_display_uses_wire_code() {
        let err = ApiError::validation("bad filename");
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] bad filename");
    }
}

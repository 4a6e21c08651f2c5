//! # Validation Module
//!
//! Input checks used at the application boundary.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Checks Run                                   │
//! │                                                                         │
//! │  Form front-end                                                        │
//! │  └── immediate feedback while typing                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  CLI command (Rust)                                                    │
//! │  └── THIS MODULE: reject NaN/∞ before exporting,                      │
//! │                   derive a safe export filename                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Totals engine                                                         │
//! │  └── no checks; propagates whatever it is given                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Negative amounts are legal document content and are not rejected here;
//! [`check_non_negative_items`] exists for callers that want the stricter
//! line-item rule.

use crate::document::QuotationDocument;
use crate::error::ValidationError;
use crate::types::LineItem;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Extension used for exported page documents.
pub const EXPORT_EXTENSION: &str = "pdf";

/// Stem used for export filenames unless configured otherwise.
pub const DEFAULT_EXPORT_PREFIX: &str = "Quotation";

// =============================================================================
// Numeric Checks
// =============================================================================

/// Fails on the first NaN or infinite number among the totals inputs.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use quote_core::document::QuotationDocument;
/// use quote_core::validation::check_finite_inputs;
///
/// let mut doc = QuotationDocument::starter(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
/// assert!(check_finite_inputs(&doc).is_ok());
///
/// doc.items[0].rate = f64::NAN;
/// assert!(check_finite_inputs(&doc).is_err());
/// ```
pub fn check_finite_inputs(doc: &QuotationDocument) -> ValidationResult<()> {
    check_finite("discountPercentage", doc.discount_percentage)?;
    check_finite("additionalCharges", doc.additional_charges)?;
    check_finite("advancePaid", doc.advance_paid)?;

    for (index, item) in doc.items.iter().enumerate() {
        for (name, value) in item_numbers(item) {
            check_finite(&format!("items[{}].{}", index, name), value)?;
        }
    }

    Ok(())
}

/// Fails if any line has a negative quantity, rate or tax rate.
pub fn check_non_negative_items(items: &[LineItem]) -> ValidationResult<()> {
    for (index, item) in items.iter().enumerate() {
        for (name, value) in item_numbers(item) {
            if value < 0.0 {
                return Err(ValidationError::MustBeNonNegative {
                    field: format!("items[{}].{}", index, name),
                });
            }
        }
    }
    Ok(())
}

fn check_finite(field: &str, value: f64) -> ValidationResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite {
            field: field.to_string(),
        })
    }
}

fn item_numbers(item: &LineItem) -> [(&'static str, f64); 4] {
    [
        ("quantity", item.quantity),
        ("rate", item.rate),
        ("cgstRate", item.cgst_rate),
        ("sgstRate", item.sgst_rate),
    ]
}

// =============================================================================
// Filename Checks
// =============================================================================

/// Default export filename for a quotation id.
///
/// Path separators and other characters that are unsafe in filenames are
/// replaced with `-`.
///
/// ## Example
/// ```rust
/// use quote_core::validation::default_export_filename;
///
/// assert_eq!(default_export_filename("REF/2025-26/001"), "Quotation-REF-2025-26-001.pdf");
/// assert_eq!(default_export_filename(""), "Quotation.pdf");
/// ```
pub fn default_export_filename(quotation_id: &str) -> String {
    export_filename(DEFAULT_EXPORT_PREFIX, quotation_id)
}

/// Export filename `<prefix>-<quotation id>.pdf`, sanitized the same way as
/// [`default_export_filename`].
pub fn export_filename(prefix: &str, quotation_id: &str) -> String {
    let prefix = sanitize_stem(prefix);
    let prefix = if prefix.is_empty() {
        DEFAULT_EXPORT_PREFIX
    } else {
        prefix.as_str()
    };

    let id = sanitize_stem(quotation_id);
    if id.is_empty() {
        format!("{}.{}", prefix, EXPORT_EXTENSION)
    } else {
        format!("{}-{}.{}", prefix, id, EXPORT_EXTENSION)
    }
}

/// Checks a user-supplied filename and appends `.pdf` when missing.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - Must not contain path separators
pub fn validate_export_filename(filename: &str) -> ValidationResult<String> {
    let filename = filename.trim();

    if filename.is_empty() {
        return Err(ValidationError::Required {
            field: "filename".to_string(),
        });
    }

    if filename.contains(['/', '\\']) {
        return Err(ValidationError::InvalidFormat {
            field: "filename".to_string(),
            reason: "must not contain path separators".to_string(),
        });
    }

    let has_extension = filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(EXPORT_EXTENSION));

    if has_extension {
        Ok(filename.to_string())
    } else {
        Ok(format!("{}.{}", filename, EXPORT_EXTENSION))
    }
}

fn sanitize_stem(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn doc() -> QuotationDocument {
        QuotationDocument::starter(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap())
    }

    #[test]
    fn test_check_finite_inputs() {
        assert!(check_finite_inputs(&doc()).is_ok());

        let mut bad = doc();
        bad.advance_paid = f64::INFINITY;
        let err = check_finite_inputs(&bad).unwrap_err();
        assert_eq!(err.to_string(), "advancePaid must be a finite number");

        let mut bad = doc();
        bad.items[0].sgst_rate = f64::NAN;
        let err = check_finite_inputs(&bad).unwrap_err();
        assert_eq!(err.to_string(), "items[0].sgstRate must be a finite number");
    }

    #[test]
    fn test_negative_amounts_are_finite() {
        let mut d = doc();
        d.discount_percentage = 150.0;
        d.advance_paid = -10.0;
        assert!(check_finite_inputs(&d).is_ok());
    }

    #[test]
    fn test_check_non_negative_items() {
        let mut d = doc();
        assert!(check_non_negative_items(&d.items).is_ok());
        d.items[0].quantity = -1.0;
        assert!(check_non_negative_items(&d.items).is_err());
    }

    #[test]
    fn test_default_export_filename() {
        assert_eq!(
            default_export_filename("REF/2025-26/001"),
            "Quotation-REF-2025-26-001.pdf"
        );
        assert_eq!(default_export_filename("  Q 7 "), "Quotation-Q-7.pdf");
        assert_eq!(default_export_filename("///"), "Quotation.pdf");
    }

    #[test]
    fn test_export_filename_prefix() {
        assert_eq!(export_filename("Offer", "Q/1"), "Offer-Q-1.pdf");
        assert_eq!(export_filename("  ", "Q1"), "Quotation-Q1.pdf");
    }

    #[test]
    fn test_validate_export_filename() {
        assert_eq!(validate_export_filename("offer").unwrap(), "offer.pdf");
        assert_eq!(validate_export_filename("offer.PDF").unwrap(), "offer.PDF");
        assert!(validate_export_filename("   ").is_err());
        assert!(validate_export_filename("../offer.pdf").is_err());
    }
}

//! # quote-core: Pure Business Logic for Quotation Studio
//!
//! This crate holds the document model and the totals engine as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Quotation Studio Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/quote-cli                               │   │
//! │  │    new ──► apply ──► totals ──► export                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ quote-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  rounding │  │  totals   │  │ document  │  │   │
//! │  │   │ LineItem  │  │ Rounding  │  │ recompute │  │  reduce   │  │   │
//! │  │   │  Totals   │  │   Mode    │  │           │  │  Action   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO RENDERING • PURE FUNCTIONS                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              quote-export (Pagination Engine)                   │   │
//! │  │        capture, paginate, write pages, export pipeline          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, Totals, parties, bank details)
//! - [`rounding`] - Rounding modes and percentage helpers
//! - [`totals`] - The totals engine
//! - [`document`] - Quotation document state and its pure transition function
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks used at the application boundary
//!
//! ## Example Usage
//!
//! ```rust
//! use quote_core::totals::{recompute, TotalsSettings};
//! use quote_core::types::LineItem;
//!
//! let mut item = LineItem::new(1);
//! item.quantity = 10.0;
//! item.rate = 5000.0;
//!
//! let totals = recompute(&[item], &TotalsSettings::default());
//! assert_eq!(totals.sub_total, 50000.0);
//! assert_eq!(totals.grand_total, 59000.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod error;
pub mod rounding;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use document::{reduce, Action, DocumentField, ItemField, QuotationDocument};
pub use error::{CoreError, ValidationError};
pub use rounding::RoundingMode;
pub use totals::{recompute, TotalsSettings};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default CGST rate (percent) applied to newly added line items.
pub const DEFAULT_CGST_RATE: f64 = 9.0;

/// Default SGST rate (percent) applied to newly added line items.
pub const DEFAULT_SGST_RATE: f64 = 9.0;

/// Days between the quotation date and the default due date.
pub const DEFAULT_DUE_DAYS: i64 = 15;

/// Label printed next to the advance deduction unless the user renames it.
pub const DEFAULT_ADVANCE_LABEL: &str = "Advance Paid";

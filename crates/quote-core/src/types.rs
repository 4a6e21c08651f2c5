//! # Domain Types
//!
//! Core domain types used throughout Quotation Studio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │     Totals      │   │  BankDetails    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (u64)       │   │  sub_total      │   │  bank_name      │       │
//! │  │  hsn            │   │  discount       │   │  account_number │       │
//! │  │  quantity, rate │   │  cgst, sgst     │   │  ifsc           │       │
//! │  │  cgst%, sgst%   │   │  grand_total    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │ CompanyDetails  │   │  ClientDetails  │                              │
//! │  │  name, address  │   │  name, address  │                              │
//! │  │  gstin, pan     │   │  gstin, pan     │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All types serialize with camelCase keys so the same JSON feeds the form
//! front-end, the render template and the CLI.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::rounding::percent_of;
use crate::{DEFAULT_CGST_RATE, DEFAULT_SGST_RATE};

// =============================================================================
// Line Item
// =============================================================================

/// One billed line of a quotation.
///
/// Monetary values are plain `f64` in major currency units. Nothing here is
/// rounded; see [`crate::rounding`] for where rounding happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Unique within one document.
    pub id: u64,

    /// Short name of the product or service.
    #[serde(default)]
    pub name: String,

    /// Free-form description printed under the name.
    #[serde(default)]
    pub description: String,

    /// HSN/SAC tax classification code.
    #[serde(default)]
    pub hsn: String,

    /// Quantity billed (>= 0).
    #[serde(default)]
    pub quantity: f64,

    /// Unit rate (>= 0).
    #[serde(default)]
    pub rate: f64,

    /// Central GST rate in percent.
    #[serde(default)]
    pub cgst_rate: f64,

    /// State GST rate in percent.
    #[serde(default)]
    pub sgst_rate: f64,
}

impl LineItem {
    /// Creates an empty line with quantity 1 and the default tax rates.
    pub fn new(id: u64) -> Self {
        LineItem {
            id,
            name: String::new(),
            description: String::new(),
            hsn: String::new(),
            quantity: 1.0,
            rate: 0.0,
            cgst_rate: DEFAULT_CGST_RATE,
            sgst_rate: DEFAULT_SGST_RATE,
        }
    }

    /// Line amount before tax (quantity × rate).
    #[inline]
    pub fn amount(&self) -> f64 {
        self.quantity * self.rate
    }

    /// CGST charged on this line.
    #[inline]
    pub fn cgst_amount(&self) -> f64 {
        percent_of(self.amount(), self.cgst_rate)
    }

    /// SGST charged on this line.
    #[inline]
    pub fn sgst_amount(&self) -> f64 {
        percent_of(self.amount(), self.sgst_rate)
    }

    /// Combined tax; the two components are summed, never compounded.
    #[inline]
    pub fn tax(&self) -> f64 {
        percent_of(self.amount(), self.cgst_rate + self.sgst_rate)
    }

    /// Line amount including tax.
    #[inline]
    pub fn total(&self) -> f64 {
        self.amount() + self.tax()
    }
}

// =============================================================================
// Parties
// =============================================================================

/// The issuing company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetails {
    pub name: String,
    /// Logo as a data URL or path understood by the render template.
    #[serde(default)]
    pub logo: Option<String>,
    pub address: String,
    #[serde(default)]
    pub gstin: String,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The client the quotation is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub gstin: String,
    #[serde(default)]
    pub pan: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Bank account printed in the payment section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    pub ifsc: String,
    pub account_type: String,
}

// =============================================================================
// Totals
// =============================================================================

/// Monetary aggregates of a document.
///
/// Always produced by [`crate::totals::recompute`]; never edited by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Σ quantity × rate.
    pub sub_total: f64,
    /// sub_total × discount% / 100.
    pub discount_amount: f64,
    /// sub_total − discount_amount. May be negative.
    pub taxable_amount: f64,
    /// Σ per-line CGST.
    pub total_cgst: f64,
    /// Σ per-line SGST.
    pub total_sgst: f64,
    /// Rounded payable amount.
    pub grand_total: f64,
}

impl Totals {
    /// True if every field is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.sub_total,
            self.discount_amount,
            self.taxable_amount,
            self.total_cgst,
            self.total_sgst,
            self.grand_total,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

//! # Quotation Document
//!
//! The full document value and its pure transition function.
//!
//! ## State Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Document Transitions                                 │
//! │                                                                         │
//! │  Form edit              Action                  Document change         │
//! │  ─────────              ──────                  ───────────────         │
//! │                                                                         │
//! │  Click "Add item" ─────► AddItem ─────────────► items.push(new)        │
//! │                                                                         │
//! │  Edit a cell ──────────► UpdateItem{id,field} ─► items[id].field = v   │
//! │                                                                         │
//! │  Click remove ─────────► RemoveItem{id} ───────► items.retain(!= id)   │
//! │                                                                         │
//! │  Change discount ──────► SetField(..) ─────────► discount = v          │
//! │                                                                         │
//! │  (caller) ─────────────► RecalculateTotals ────► totals = recompute()  │
//! │                                                                         │
//! │  `reduce` never recalculates on its own. Callers use                    │
//! │  `apply_and_recompute` or send RecalculateTotals explicitly.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Actions deserialize from JSON tagged by `type`:
//! ```json
//! { "type": "UPDATE_ITEM", "id": 1, "field": { "name": "rate", "value": 4500 } }
//! ```

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::rounding::RoundingMode;
use crate::totals::{recompute, TotalsSettings};
use crate::types::{BankDetails, ClientDetails, CompanyDetails, LineItem, Totals};
use crate::{DEFAULT_ADVANCE_LABEL, DEFAULT_DUE_DAYS};

// =============================================================================
// Document
// =============================================================================

/// Everything needed to render and total one quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDocument {
    /// Current step of the multi-step form.
    #[serde(default = "default_step")]
    pub step: u8,
    pub quotation_name: String,
    pub quotation_id: String,
    #[ts(as = "String")]
    pub quotation_date: NaiveDate,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub company_details: CompanyDetails,
    pub client_details: ClientDetails,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub terms: String,
    #[serde(default)]
    pub additional_notes: String,
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub advance_paid: f64,
    #[serde(default = "default_advance_label")]
    pub advance_field_label: String,
    #[serde(default)]
    pub rounding_type: RoundingMode,
    #[serde(default)]
    pub line_tax_rounding: RoundingMode,
    #[serde(default)]
    pub additional_charges: f64,
    /// Signature image as a data URL or path understood by the template.
    #[serde(default)]
    pub signature: Option<String>,
    /// Last recomputed totals. Stale until `RecalculateTotals` runs.
    #[serde(default)]
    pub totals: Totals,
}

fn default_step() -> u8 {
    1
}

fn default_advance_label() -> String {
    DEFAULT_ADVANCE_LABEL.to_string()
}

impl QuotationDocument {
    /// Creates a starter quotation dated `today`, with one sample line and
    /// totals already computed.
    ///
    /// The date is a parameter so that construction stays pure.
    pub fn starter(today: NaiveDate) -> Self {
        let doc = QuotationDocument {
            step: default_step(),
            quotation_name: "Quotation".to_string(),
            quotation_id: "REF/2025-26/001".to_string(),
            quotation_date: today,
            due_date: today + Duration::days(DEFAULT_DUE_DAYS),
            company_details: CompanyDetails {
                name: "Your Company".to_string(),
                address: "123 Business Rd, Business City".to_string(),
                email: Some("example@example.com".to_string()),
                phone: Some("+123456789".to_string()),
                ..CompanyDetails::default()
            },
            client_details: ClientDetails {
                name: "Client Company".to_string(),
                address: "456 Client Ave, Client Town".to_string(),
                email: Some("example@example.com".to_string()),
                phone: Some("+123456789".to_string()),
                ..ClientDetails::default()
            },
            items: vec![LineItem {
                name: "Premium Web Development".to_string(),
                description:
                    "Full-stack development of a responsive website with a modern tech stack."
                        .to_string(),
                hsn: "9983".to_string(),
                quantity: 10.0,
                rate: 5000.0,
                ..LineItem::new(1)
            }],
            bank_details: Some(BankDetails {
                bank_name: "Global Bank".to_string(),
                account_holder: "Your Company Inc.".to_string(),
                account_number: "1234567890".to_string(),
                ifsc: "GBIN0001234".to_string(),
                account_type: "Current".to_string(),
            }),
            terms: "Please pay within 15 days. Overdue payments are subject to a 1.5% monthly interest rate."
                .to_string(),
            additional_notes:
                "We appreciate your business and look forward to working with you again."
                    .to_string(),
            discount_percentage: 0.0,
            advance_paid: 0.0,
            advance_field_label: default_advance_label(),
            rounding_type: RoundingMode::None,
            line_tax_rounding: RoundingMode::None,
            additional_charges: 0.0,
            signature: None,
            totals: Totals::default(),
        };
        doc.with_recomputed_totals()
    }

    /// Parses a document from JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Inputs of the totals engine taken from this document.
    pub fn totals_settings(&self) -> TotalsSettings {
        TotalsSettings {
            discount_percentage: self.discount_percentage,
            additional_charges: self.additional_charges,
            advance_paid: self.advance_paid,
            rounding: self.rounding_type,
            line_tax_rounding: self.line_tax_rounding,
        }
    }

    /// Returns the document with `totals` recomputed from its inputs.
    pub fn with_recomputed_totals(mut self) -> Self {
        self.totals = recompute(&self.items, &self.totals_settings());
        self
    }

    /// True if the stored totals match what the inputs produce.
    pub fn totals_are_current(&self) -> bool {
        recompute(&self.items, &self.totals_settings()) == self.totals
    }

    /// Looks up a line item by id.
    pub fn item(&self, id: u64) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Id for the next added item: one past the largest id in use.
    /// One past the largest id; the lowest free id once that would overflow.
    fn next_item_id(&self) -> u64 {
        let max = self.items.iter().map(|i| i.id).max().unwrap_or(0);
        max.checked_add(1).unwrap_or_else(|| {
            let taken: HashSet<u64> = self.items.iter().map(|i| i.id).collect();
            // At most `len` ids are taken, so this stops by `len + 1`.
            (1..).find(|id| !taken.contains(id)).unwrap_or_default()
        })
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A single edit to the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Move the form to another step.
    SetStep { step: u8 },
    /// Replace one top-level field.
    SetField { field: DocumentField },
    /// Replace one company field.
    SetCompanyDetails { field: CompanyField },
    /// Replace one client field.
    SetClientDetails { field: ClientField },
    /// Replace one bank field, creating the bank section if absent.
    SetBankDetails { field: BankField },
    /// Append a blank line item with default tax rates.
    AddItem,
    /// Replace one field of the item with `id`.
    UpdateItem { id: u64, field: ItemField },
    /// Remove the item with `id`, keeping the order of the rest.
    RemoveItem { id: u64 },
    /// Recompute `totals` from the current inputs.
    RecalculateTotals,
}

/// Top-level document fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "camelCase")]
pub enum DocumentField {
    QuotationName(String),
    QuotationId(String),
    QuotationDate(NaiveDate),
    DueDate(NaiveDate),
    Items(Vec<LineItem>),
    Terms(String),
    AdditionalNotes(String),
    DiscountPercentage(f64),
    AdvancePaid(f64),
    AdvanceFieldLabel(String),
    RoundingType(RoundingMode),
    LineTaxRounding(RoundingMode),
    AdditionalCharges(f64),
    Signature(Option<String>),
}

/// Company fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "camelCase")]
pub enum CompanyField {
    Name(String),
    Logo(Option<String>),
    Address(String),
    Gstin(String),
    Pan(Option<String>),
    Email(Option<String>),
    Phone(Option<String>),
}

/// Client fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "camelCase")]
pub enum ClientField {
    Name(String),
    Address(String),
    Gstin(String),
    Pan(Option<String>),
    Email(Option<String>),
    Phone(Option<String>),
}

/// Bank fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "camelCase")]
pub enum BankField {
    BankName(String),
    AccountHolder(String),
    AccountNumber(String),
    Ifsc(String),
    AccountType(String),
}

/// Line item fields. The id is not editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "camelCase")]
pub enum ItemField {
    Name(String),
    Description(String),
    Hsn(String),
    Quantity(f64),
    Rate(f64),
    CgstRate(f64),
    SgstRate(f64),
}

impl Action {
    /// True if the action changes an input of the totals engine.
    pub fn needs_recompute(&self) -> bool {
        match self {
            Action::AddItem | Action::RemoveItem { .. } => true,
            Action::UpdateItem { field, .. } => matches!(
                field,
                ItemField::Quantity(_)
                    | ItemField::Rate(_)
                    | ItemField::CgstRate(_)
                    | ItemField::SgstRate(_)
            ),
            Action::SetField { field } => matches!(
                field,
                DocumentField::Items(_)
                    | DocumentField::DiscountPercentage(_)
                    | DocumentField::AdvancePaid(_)
                    | DocumentField::RoundingType(_)
                    | DocumentField::LineTaxRounding(_)
                    | DocumentField::AdditionalCharges(_)
            ),
            Action::SetStep { .. }
            | Action::SetCompanyDetails { .. }
            | Action::SetClientDetails { .. }
            | Action::SetBankDetails { .. }
            | Action::RecalculateTotals => false,
        }
    }
}

// =============================================================================
// Reducer
// =============================================================================

/// Applies one action and returns the next document.
///
/// Pure: the only inputs are `state` and `action`. Totals are left as they
/// were unless the action is `RecalculateTotals`.
///
/// ## Errors
/// `CoreError::ItemNotFound` when `UpdateItem`/`RemoveItem` names an id that
/// is not in the document.
pub fn reduce(mut state: QuotationDocument, action: Action) -> CoreResult<QuotationDocument> {
    match action {
        Action::SetStep { step } => state.step = step,
        Action::SetField { field } => set_document_field(&mut state, field),
        Action::SetCompanyDetails { field } => {
            let company = &mut state.company_details;
            match field {
                CompanyField::Name(v) => company.name = v,
                CompanyField::Logo(v) => company.logo = v,
                CompanyField::Address(v) => company.address = v,
                CompanyField::Gstin(v) => company.gstin = v,
                CompanyField::Pan(v) => company.pan = v,
                CompanyField::Email(v) => company.email = v,
                CompanyField::Phone(v) => company.phone = v,
            }
        }
        Action::SetClientDetails { field } => {
            let client = &mut state.client_details;
            match field {
                ClientField::Name(v) => client.name = v,
                ClientField::Address(v) => client.address = v,
                ClientField::Gstin(v) => client.gstin = v,
                ClientField::Pan(v) => client.pan = v,
                ClientField::Email(v) => client.email = v,
                ClientField::Phone(v) => client.phone = v,
            }
        }
        Action::SetBankDetails { field } => {
            let bank = state.bank_details.get_or_insert_with(BankDetails::default);
            match field {
                BankField::BankName(v) => bank.bank_name = v,
                BankField::AccountHolder(v) => bank.account_holder = v,
                BankField::AccountNumber(v) => bank.account_number = v,
                BankField::Ifsc(v) => bank.ifsc = v,
                BankField::AccountType(v) => bank.account_type = v,
            }
        }
        Action::AddItem => {
            let id = state.next_item_id();
            state.items.push(LineItem::new(id));
        }
        Action::UpdateItem { id, field } => {
            let item = state
                .items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or(CoreError::ItemNotFound(id))?;
            match field {
                ItemField::Name(v) => item.name = v,
                ItemField::Description(v) => item.description = v,
                ItemField::Hsn(v) => item.hsn = v,
                ItemField::Quantity(v) => item.quantity = v,
                ItemField::Rate(v) => item.rate = v,
                ItemField::CgstRate(v) => item.cgst_rate = v,
                ItemField::SgstRate(v) => item.sgst_rate = v,
            }
        }
        Action::RemoveItem { id } => {
            let before = state.items.len();
            state.items.retain(|i| i.id != id);
            if state.items.len() == before {
                return Err(CoreError::ItemNotFound(id));
            }
        }
        Action::RecalculateTotals => {
            state = state.with_recomputed_totals();
        }
    }
    Ok(state)
}

fn set_document_field(state: &mut QuotationDocument, field: DocumentField) {
    match field {
        DocumentField::QuotationName(v) => state.quotation_name = v,
        DocumentField::QuotationId(v) => state.quotation_id = v,
        DocumentField::QuotationDate(v) => state.quotation_date = v,
        DocumentField::DueDate(v) => state.due_date = v,
        DocumentField::Items(v) => state.items = v,
        DocumentField::Terms(v) => state.terms = v,
        DocumentField::AdditionalNotes(v) => state.additional_notes = v,
        DocumentField::DiscountPercentage(v) => state.discount_percentage = v,
        DocumentField::AdvancePaid(v) => state.advance_paid = v,
        DocumentField::AdvanceFieldLabel(v) => state.advance_field_label = v,
        DocumentField::RoundingType(v) => state.rounding_type = v,
        DocumentField::LineTaxRounding(v) => state.line_tax_rounding = v,
        DocumentField::AdditionalCharges(v) => state.additional_charges = v,
        DocumentField::Signature(v) => state.signature = v,
    }
}

/// Applies an action, then recalculates totals if the action touched one of
/// their inputs.
pub fn apply_and_recompute(
    state: QuotationDocument,
    action: Action,
) -> CoreResult<QuotationDocument> {
    let recalc = action.needs_recompute();
    let next = reduce(state, action)?;
    if recalc {
        reduce(next, Action::RecalculateTotals)
    } else {
        Ok(next)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn starter() -> QuotationDocument {
        QuotationDocument::starter(today())
    }

    #[test]
    fn test_starter_document() {
        let doc = starter();
        assert_eq!(doc.due_date, NaiveDate::from_ymd_opt(2025, 4, 16).unwrap());
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.totals.grand_total, 59000.0);
        assert!(doc.totals_are_current());
    }

    #[test]
    fn test_add_item_uses_fresh_id_and_defaults() {
        let doc = reduce(starter(), Action::AddItem).unwrap();
        let doc = reduce(doc, Action::AddItem).unwrap();

        let ids: Vec<u64> = doc.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let added = doc.item(3).unwrap();
        assert_eq!(added.cgst_rate, 9.0);
        assert_eq!(added.sgst_rate, 9.0);
        assert_eq!(added.quantity, 1.0);
    }

    #[test]
    fn test_add_item_after_largest_possible_id() {
        let mut doc = starter();
        doc.items[0].id = u64::MAX;
        let json = serde_json::to_string(&doc).unwrap();
        let doc = QuotationDocument::from_json(&json).unwrap();

        let doc = reduce(doc, Action::AddItem).unwrap();
        let doc = reduce(doc, Action::AddItem).unwrap();

        let ids: Vec<u64> = doc.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![u64::MAX, 1, 2]);
    }

    #[test]
    fn test_reduce_does_not_recalculate() {
        let doc = reduce(
            starter(),
            Action::UpdateItem {
                id: 1,
                field: ItemField::Quantity(20.0),
            },
        )
        .unwrap();

        assert_eq!(doc.totals.grand_total, 59000.0);
        assert!(!doc.totals_are_current());

        let doc = reduce(doc, Action::RecalculateTotals).unwrap();
        assert_eq!(doc.totals.grand_total, 118000.0);
    }

    #[test]
    fn test_apply_and_recompute() {
        let doc = apply_and_recompute(
            starter(),
            Action::SetField {
                field: DocumentField::DiscountPercentage(10.0),
            },
        )
        .unwrap();
        assert_eq!(doc.totals.discount_amount, 5000.0);
        assert!(doc.totals_are_current());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut doc = starter();
        for _ in 0..3 {
            doc = reduce(doc, Action::AddItem).unwrap();
        }
        let doc = reduce(doc, Action::RemoveItem { id: 2 }).unwrap();
        let ids: Vec<u64> = doc.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_unknown_item_is_an_error() {
        let err = reduce(starter(), Action::RemoveItem { id: 99 }).unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(99)));

        let err = reduce(
            starter(),
            Action::UpdateItem {
                id: 42,
                field: ItemField::Rate(1.0),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(42)));
    }

    #[test]
    fn test_bank_details_created_on_first_field() {
        let mut doc = starter();
        doc.bank_details = None;
        let doc = reduce(
            doc,
            Action::SetBankDetails {
                field: BankField::Ifsc("HDFC0000001".to_string()),
            },
        )
        .unwrap();
        let bank = doc.bank_details.unwrap();
        assert_eq!(bank.ifsc, "HDFC0000001");
        assert!(bank.bank_name.is_empty());
    }

    #[test]
    fn test_needs_recompute() {
        assert!(Action::AddItem.needs_recompute());
        assert!(!Action::SetStep { step: 2 }.needs_recompute());
        assert!(!Action::UpdateItem {
            id: 1,
            field: ItemField::Hsn("9983".to_string())
        }
        .needs_recompute());
        assert!(Action::SetField {
            field: DocumentField::RoundingType(RoundingMode::Up)
        }
        .needs_recompute());
    }

    #[test]
    fn test_action_json() {
        let action: Action = serde_json::from_str(
            r#"{"type": "UPDATE_ITEM", "id": 1, "field": {"name": "rate", "value": 4500}}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Action::UpdateItem {
                id: 1,
                field: ItemField::Rate(4500.0)
            }
        );

        let action: Action = serde_json::from_str(r#"{"type": "ADD_ITEM"}"#).unwrap();
        assert_eq!(action, Action::AddItem);

        let action: Action = serde_json::from_str(
            r#"{"type": "SET_FIELD", "field": {"name": "roundingType", "value": "up"}}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Action::SetField {
                field: DocumentField::RoundingType(RoundingMode::Up)
            }
        );
    }

    #[test]
    fn test_document_json_roundtrip_keeps_dates() {
        let json = serde_json::to_string(&starter()).unwrap();
        assert!(json.contains("\"quotationDate\":\"2025-04-01\""));
        let parsed = QuotationDocument::from_json(&json).unwrap();
        assert_eq!(parsed, starter());
    }
}

//! # Document Commands
//!
//! Create, load, edit and total quotation documents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  quote new ─────► starter document (JSON on stdout)                    │
//! │                                                                         │
//! │  quote apply doc.json actions.json                                      │
//! │      load ──► dispatch each action ──► updated document                │
//! │               (totals recalculated when an input changed)              │
//! │                                                                         │
//! │  quote totals doc.json                                                  │
//! │      load ──► reject NaN/∞ ──► recompute ──► Totals                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use quote_core::validation::check_finite_inputs;
use quote_core::{recompute, Action, QuotationDocument, Totals};

use crate::error::ApiError;
use crate::state::DocumentState;

/// A starter document dated `today`.
pub fn new_document(today: NaiveDate) -> QuotationDocument {
    debug!(%today, "new_document command");
    QuotationDocument::starter(today)
}

/// Reads and parses a document file.
pub async fn load_document(path: &Path) -> Result<QuotationDocument, ApiError> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        ApiError::new(
            crate::error::ErrorCode::IoError,
            format!("cannot read '{}': {}", path.display(), e),
        )
    })?;
    let doc = QuotationDocument::from_json(&json)?;
    info!(path = %path.display(), items = doc.items.len(), "Document loaded");
    Ok(doc)
}

/// Totals recomputed from the document inputs.
///
/// Stored totals in the file are ignored.
pub fn get_totals(state: &DocumentState) -> Result<Totals, ApiError> {
    state.with_doc(|doc| -> Result<Totals, ApiError> {
        check_finite_inputs(doc)?;
        if !doc.totals_are_current() {
            debug!("Stored totals are stale");
        }
        Ok(recompute(&doc.items, &doc.totals_settings()))
    })
}

/// Either one action or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ActionBatch {
    Many(Vec<Action>),
    One(Action),
}

/// Parses actions from JSON: a single object or an array.
pub fn parse_actions(json: &str) -> Result<Vec<Action>, ApiError> {
    let batch: ActionBatch = serde_json::from_str(json)?;
    Ok(match batch {
        ActionBatch::Many(actions) => actions,
        ActionBatch::One(action) => vec![action],
    })
}

/// Applies `actions` in order and returns the resulting document.
///
/// Stops at the first failing action; earlier actions stay applied.
pub fn apply_actions(
    state: &DocumentState,
    actions: Vec<Action>,
) -> Result<QuotationDocument, ApiError> {
    let count = actions.len();
    for action in actions {
        state.dispatch(action)?;
    }
    info!(actions = count, "Actions applied");
    Ok(state.snapshot())
}

//! # Document State
//!
//! The working quotation, shared behind a mutex.
//!
//! Every edit goes through the pure reducer in `quote-core`. The stored
//! document is only replaced when the reducer succeeds, so a failed action
//! leaves the previous state intact.
//!
//! Exports work on a snapshot ([`DocumentState::snapshot`]) so the document
//! stays read-only for the whole pipeline.

use std::sync::{Arc, Mutex};

use quote_core::document::apply_and_recompute;
use quote_core::{Action, QuotationDocument};
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct DocumentState {
    doc: Arc<Mutex<QuotationDocument>>,
}

impl DocumentState {
    pub fn new(doc: QuotationDocument) -> Self {
        DocumentState {
            doc: Arc::new(Mutex::new(doc)),
        }
    }

    /// Executes a function with read access to the document.
    pub fn with_doc<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&QuotationDocument) -> R,
    {
        let doc = self.doc.lock().expect("Document mutex poisoned");
        f(&doc)
    }

    /// Executes a function with write access to the document.
    pub fn with_doc_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut QuotationDocument) -> R,
    {
        let mut doc = self.doc.lock().expect("Document mutex poisoned");
        f(&mut doc)
    }

    /// Applies one action, recalculating totals when its inputs changed.
    pub fn dispatch(&self, action: Action) -> Result<(), ApiError> {
        debug!(?action, "Dispatching action");
        self.with_doc_mut(|doc| -> Result<(), ApiError> {
            *doc = apply_and_recompute(doc.clone(), action)?;
            Ok(())
        })
    }

    /// Owned copy of the current document.
    pub fn snapshot(&self) -> QuotationDocument {
        self.with_doc(QuotationDocument::clone)
    }
}

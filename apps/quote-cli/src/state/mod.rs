//! # State Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │   DocumentState              │   │   ConfigState                │   │
//! │  │                              │   │                              │   │
//! │  │   Arc<Mutex<                 │   │   page geometry              │   │
//! │  │     QuotationDocument        │   │   capture scale, background  │   │
//! │  │   >>                         │   │   output dir, filename prefix│   │
//! │  └──────────────────────────────┘   └──────────────────────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DocumentState: edits serialized by the mutex; exports use snapshots │
//! │  • ConfigState: read-only after loading                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod document;

pub use config::{CaptureSettings, ConfigState, OutputSettings, PageSettings};
pub use document::DocumentState;

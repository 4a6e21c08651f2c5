//! # Quotation Studio CLI Entry Point
//!
//! ```text
//! quote new [--date YYYY-MM-DD]                 starter document
//! quote totals <doc.json>                       recomputed totals
//! quote apply <doc.json> <actions.json>         edited document
//! quote export <doc.json> --surface <png>       paginated PDF
//!              [--filename F] [--config C]
//! ```
//!
//! The actual setup is in lib.rs for testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    quote_cli_lib::run().await
}

//! # Commands Module
//!
//! One function per CLI subcommand. Each takes the state it needs and
//! returns `Result<T, ApiError>`; `lib.rs` handles printing.

pub mod document;
pub mod export;

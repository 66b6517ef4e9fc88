//! finwatch Types - Snapshot and alert types shared across finwatch
//!
//! This crate contains the wire-level data model with zero dependencies on
//! other finwatch crates:
//!
//! - Snapshot records read from the finance API (`Account`, `Expense`)
//! - Alert payloads written back to it (`AlertEvent`, `AlertKind`, `Severity`)
//! - Dedupe keys identifying one logical alert occurrence (`DedupeKey`)
//!
//! # Wire format
//!
//! ```text
//! GET  /api/balances  -> {"accounts": [{id, name, type, balance}]}
//! GET  /api/expenses  -> {"expenses": [{id, name, category, amount, date}]}
//! POST /api/alerts    <- {txn_id, kind, message, severity, amount, balance}
//! ```

pub mod account;
pub mod alert;
pub mod expense;

pub use account::*;
pub use alert::*;
pub use expense::*;

/// Calendar date format used on the wire and in dedupe keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

//! Core types and the annual report aggregator for the PICC storytelling
//! platform.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`source::RecordSource`]; everything else depends on
//! that abstraction.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod format;
pub mod period;
pub mod record;
pub mod report;
pub mod source;

pub use error::{Error, Result};
pub use report::{ReportDocument, generate_annual_report};

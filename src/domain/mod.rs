//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - layers, parsed rows, and chart payload types (`types`)
//! - the per-layer ledger registry with colours and display names (`ledgers`)
//! - per-layer metric columns (`metrics`)
//! - option -> file-name lookup tables (`selection`)

pub mod ledgers;
pub mod metrics;
pub mod selection;
pub mod types;

pub use ledgers::*;
pub use metrics::*;
pub use selection::*;
pub use types::*;

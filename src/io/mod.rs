//! Input/output helpers.
//!
//! - date parsing (`date`)
//! - CSV ingest for every layer, doughnut and governance files (`ingest`)
//! - chart payload exports (JSON) (`export`)

pub mod date;
pub mod export;
pub mod ingest;

pub use date::*;
pub use export::*;
pub use ingest::*;

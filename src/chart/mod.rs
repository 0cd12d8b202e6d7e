//! Chart payload builders.
//!
//! - one series per ledger over a date window (`build`)
//! - the interactive `[start, end]` window controller (`window`)
//! - doughnut top-N with an "Others" bucket (`doughnut`)
//! - governance dual-axis and unified-metric adapters (`governance`)
//! - per-ledger radar snapshots (`radar`)

pub mod build;
pub mod doughnut;
pub mod governance;
pub mod radar;
pub mod window;

pub use build::*;
pub use doughnut::*;
pub use governance::*;
pub use radar::*;
pub use window::*;

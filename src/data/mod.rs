//! Data acquisition: CSV sources and request bookkeeping.

pub mod source;
pub mod tracker;

pub use source::*;
pub use tracker::*;

//! `decent-charts` library crate.
//!
//! The binary (`dcharts`) is a thin wrapper around this library so that:
//!
//! - parsing and chart building are testable without spawning processes
//! - the same pipeline drives both the one-shot CLI and the TUI
//! - code stays easy to navigate as layers and chart kinds are added

pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod prefs;
pub mod report;
pub mod tui;

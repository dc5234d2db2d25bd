//! `wafer-cost` library crate.
//!
//! The binary (`wafer`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the pipeline can be embedded with an in-memory data source
//! - code stays easy to navigate as the project grows

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod sim;

//! Input/output helpers.
//!
//! - CSV ingest of price and forecast datasets (`ingest`)
//! - injectable data sources for the pipeline (`repository`)
//! - CSV/JSON exports (`export`)

pub mod export;
pub mod ingest;
pub mod repository;

pub use export::*;
pub use ingest::*;
pub use repository::*;

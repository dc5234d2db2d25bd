//! Shock-to-margin simulation.

pub mod margin;

pub use margin::*;

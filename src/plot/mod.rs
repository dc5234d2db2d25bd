//! Terminal plotting.

pub mod ascii;

pub use ascii::{render_macro_cycle, render_series_plot};

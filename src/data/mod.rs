//! Series preparation.
//!
//! - `normalize`: raw rows → ordered price series + macro proxy columns
//! - `sample`: synthetic price/forecast datasets for offline runs

pub mod normalize;
pub mod sample;

pub use normalize::{derive_auxiliary, normalize, normalize_prices, parse_date, ratio_series};
pub use sample::{SampleData, generate_forecast, generate_sample};

//! Series analytics.
//!
//! - monthly OHLC resampling (`resample`)
//! - Pearson correlation, lagged correlation and matrices (`correlation`)
//! - least-squares price driver attribution (`drivers`)

pub mod correlation;
pub mod drivers;
pub mod resample;

pub use correlation::*;
pub use drivers::*;
pub use resample::*;

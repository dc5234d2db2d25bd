//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and normalized price observations (`RawPriceRow`, `PricePoint`, `PriceSeries`)
//! - derived series and bars (`AuxiliarySeries`, `OhlcBar`, `CorrelationMatrix`)
//! - the technology node table and simulation output (`TechNode`, `SimulationResult`)
//! - run configuration (`Scenario`, `ScenarioConfig`, `SampleConfig`)

pub mod types;

pub use types::*;

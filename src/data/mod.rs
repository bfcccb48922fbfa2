//! Data structures for sensor readings.
//!
//! This module contains the decoded reading type and the per-cycle sample
//! accumulator used by the CSV flow.

pub mod reading;
pub mod sample_set;

pub use reading::{Reading, SensorKind};
pub use sample_set::{CompleteSample, SampleSet};

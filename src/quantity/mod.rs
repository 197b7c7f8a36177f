//! Quantity normalization module
//!
//! Parses recipe quantity text into canonical units.

pub mod normalizer;
pub mod units;

pub use normalizer::{normalize, NormalizationError, NormalizedQuantity, PipelineStep};
pub use units::{Measure, Unit};

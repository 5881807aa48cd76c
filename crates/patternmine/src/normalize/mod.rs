//! Record normalization and cleaning.

mod cleaner;
mod normalizer;

pub use cleaner::{Cleaned, Cleaner, OutlierPolicy};
pub use normalizer::{NormalizeReport, Normalized, Normalizer};

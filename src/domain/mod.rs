//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Artifacts live in `adapters`.

mod features;
mod prediction;

pub use features::{
    CountryIndicators, FeatureError, FeatureVector, FEATURE_COUNT, FEATURE_NAMES, FORM_FIELDS,
};
pub use prediction::{PredictionResult, WasteCategory, HIGH_CLASS_CODE};

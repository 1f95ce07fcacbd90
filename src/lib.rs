//! # wastecast
//!
//! Food waste category prediction served as an HTML form over HTTP.
//!
//! A request carries two country indicators (GDP per capita and literacy
//! rate). They are scaled with a fitted standard scaler, classified by a
//! fitted model, and the class code is mapped to a `High` / `Low` label.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (indicators, feature vectors, categories)
//! - `ports`: Traits for the fitted normalizer and classifier
//! - `adapters`: scikit-learn artifact formats, artifact loading, log sanitizing
//! - `application`: The prediction pipeline
//! - `web`: HTTP routes and the HTML form
//! - `config`: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod web;

pub use domain::{CountryIndicators, FeatureVector, PredictionResult, WasteCategory};

/// Result type for wastecast operations
pub type Result<T> = std::result::Result<T, WastecastError>;

/// Error for a single prediction request. Artifact loading failures happen
/// at startup and surface as `adapters::ArtifactError`.
#[derive(Debug, thiserror::Error)]
pub enum WastecastError {
    #[error("Invalid input: {0}")]
    Input(#[from] domain::FeatureError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ports::InferenceError),
}

impl WastecastError {
    /// True when the caller sent bad input, false for model or
    /// infrastructure failures.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

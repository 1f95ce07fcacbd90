//! Adapters layer: Concrete implementations of ports.
//!
//! - `sklearn`: scaler and classifier artifacts exported from scikit-learn
//! - `artifacts`: loading and manifest verification
//! - `sanitize`: log output filtering

pub mod artifacts;
pub mod sanitize;
pub mod sklearn;

pub use artifacts::{ArtifactError, ArtifactLoader, LoadedArtifacts};
pub use sklearn::{ClassifierArtifact, ScalingParameters};

//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the fitted artifacts it consumes.

mod classifier;
mod normalizer;

pub use classifier::{Classifier, InferenceError};
pub use normalizer::FeatureNormalizer;

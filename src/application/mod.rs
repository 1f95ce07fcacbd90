//! Application layer: Use cases and services.
//!
//! Orchestrates domain logic with ports to implement prediction.

mod prediction;

pub use prediction::PredictionService;

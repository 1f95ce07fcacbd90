//! Classifier port: Trait for fitted classification models.

use crate::domain::FeatureVector;

/// Errors raised while scaling or classifying a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("Feature count mismatch: artifact expects {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Input contains NaN or infinity")]
    NonFiniteInput,

    #[error("Model evaluation failed: {0}")]
    Model(String),
}

/// A fitted classifier loaded once at startup.
///
/// Implementations are immutable after construction so a single instance can
/// serve concurrent requests without locking.
pub trait Classifier: Send + Sync {
    /// Number of features the model was fitted on.
    fn n_features(&self) -> usize;

    /// Class codes the model can emit, in fitted order.
    fn classes(&self) -> &[i64];

    /// Predict the class code for one scaled row.
    ///
    /// # Errors
    /// Returns `InferenceError::DimensionMismatch` if the row width differs
    /// from `n_features()`, and `InferenceError::NonFiniteInput` if any value
    /// is NaN or infinite.
    fn predict(&self, scaled: &FeatureVector) -> Result<i64, InferenceError>;
}

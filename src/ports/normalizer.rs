//! Feature normalizer port: Trait for fitted feature transforms.

use crate::domain::FeatureVector;

use super::InferenceError;

/// A fitted feature transform applied before classification.
pub trait FeatureNormalizer: Send + Sync {
    /// Number of features the transform was fitted on.
    fn n_features(&self) -> usize;

    /// Feature names recorded at fit time, if the artifact carries them.
    fn feature_names(&self) -> Option<&[String]>;

    /// Scale one raw row.
    ///
    /// # Errors
    /// Returns `InferenceError::DimensionMismatch` if the row width differs
    /// from `n_features()`.
    fn transform(&self, raw: &FeatureVector) -> Result<FeatureVector, InferenceError>;
}

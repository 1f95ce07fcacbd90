//! Standard scaler exported from a fitted scikit-learn `StandardScaler`.

use serde::{Deserialize, Serialize};

use crate::adapters::ArtifactError;
use crate::domain::{FeatureVector, FEATURE_COUNT};
use crate::ports::{FeatureNormalizer, InferenceError};

/// Per-feature `(mean, scale)` pairs fixed at fit time.
///
/// Matches the JSON written by the training export: `mean` and `scale`
/// (or scikit-learn's `mean_` / `scale_` attribute names) plus optional
/// `feature_names` in fitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParameters {
    #[serde(default, alias = "feature_names_in_", skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,

    #[serde(alias = "mean_")]
    mean: Vec<f64>,

    #[serde(alias = "scale_")]
    scale: Vec<f64>,
}

impl ScalingParameters {
    /// Build scaling parameters from fitted means and scales.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the parameters fail validation.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        let params = Self {
            feature_names: None,
            mean,
            scale,
        };
        params.validate()?;
        Ok(params)
    }

    /// Attach the fitted feature names.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the name count differs from the
    /// parameter count.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self, ArtifactError> {
        self.feature_names = Some(names);
        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Structural checks run after deserialization.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let n = self.mean.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("scaler has no features".into()));
        }
        if self.scale.len() != n {
            return Err(ArtifactError::Invalid(format!(
                "scaler mean has {n} entries but scale has {}",
                self.scale.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != n {
                return Err(ArtifactError::Invalid(format!(
                    "scaler has {n} parameters but {} feature names",
                    names.len()
                )));
            }
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "scaler mean[{i}] is not finite"
            )));
        }
        if let Some(i) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ArtifactError::Invalid(format!(
                "scaler scale[{i}] must be finite and non-zero"
            )));
        }
        Ok(())
    }
}

impl FeatureNormalizer for ScalingParameters {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn transform(&self, raw: &FeatureVector) -> Result<FeatureVector, InferenceError> {
        if self.mean.len() != raw.len() {
            return Err(InferenceError::DimensionMismatch {
                expected: self.mean.len(),
                got: raw.len(),
            });
        }

        let mut out = [0.0; FEATURE_COUNT];
        for (i, x) in raw.as_slice().iter().enumerate() {
            out[i] = (x - self.mean[i]) / self.scale[i];
        }
        Ok(FeatureVector::new(out))
    }
}

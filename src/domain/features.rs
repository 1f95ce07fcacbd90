//! Feature types for food waste category prediction.
//!
//! Both features are country-level indicators. Their order is fixed and must
//! match the order the scaler and classifier artifacts were fitted with.

use serde::{Deserialize, Serialize};

/// Number of features the prediction pipeline works with.
pub const FEATURE_COUNT: usize = 2;

/// Feature names in fitted order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["gdp_per_capita", "literacy_rate"];

/// Form field names carrying each feature, in fitted order.
pub const FORM_FIELDS: [&str; FEATURE_COUNT] = ["feature1", "feature2"];

/// Longest raw value kept in a parse error (keeps log lines bounded).
const MAX_ERROR_VALUE_CHARS: usize = 64;

/// Errors raised while coercing raw form input into features.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("missing form field `{field}`")]
    Missing { field: &'static str },

    #[error("form field `{field}` is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },
}

/// Raw indicator values as submitted, before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountryIndicators {
    /// GDP per capita in USD (`feature1`)
    pub gdp_per_capita: f64,

    /// Literacy rate in percent (`feature2`)
    pub literacy_rate: f64,
}

impl CountryIndicators {
    /// Create indicators from already-numeric values.
    #[must_use]
    pub fn new(gdp_per_capita: f64, literacy_rate: f64) -> Self {
        Self {
            gdp_per_capita,
            literacy_rate,
        }
    }

    /// Coerce the two form values into indicators.
    ///
    /// Only type coercion happens here: any string that parses as a float is
    /// accepted, including out-of-domain values, `inf` and `NaN`.
    ///
    /// # Errors
    /// Returns `FeatureError` if a field is absent or not a number.
    pub fn parse(feature1: Option<&str>, feature2: Option<&str>) -> Result<Self, FeatureError> {
        Ok(Self {
            gdp_per_capita: parse_field(FORM_FIELDS[0], feature1)?,
            literacy_rate: parse_field(FORM_FIELDS[1], feature2)?,
        })
    }

    /// Assemble the fixed-order feature vector.
    #[must_use]
    pub fn to_vector(&self) -> FeatureVector {
        FeatureVector::new([self.gdp_per_capita, self.literacy_rate])
    }
}

fn parse_field(field: &'static str, raw: Option<&str>) -> Result<f64, FeatureError> {
    let raw = raw.ok_or(FeatureError::Missing { field })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FeatureError::NotANumber {
            field,
            value: raw.chars().take(MAX_ERROR_VALUE_CHARS).collect(),
        })
}

/// Fixed-order feature vector, raw or scaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every component is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

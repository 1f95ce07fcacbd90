//! Prediction result types.
//!
//! Represents the output of the food waste classifier after label mapping.

use serde::{Deserialize, Serialize};

/// Class code the classifier emits for the high waste category.
pub const HIGH_CLASS_CODE: i64 = 1;

/// Food waste category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WasteCategory {
    Low,
    High,
}

impl WasteCategory {
    /// Map a classifier class code to a category.
    ///
    /// `1` is `High`; every other code is `Low`. This assumes a two-class
    /// model coded 0/1 and is not derived from the artifact.
    #[must_use]
    pub fn from_class_code(code: i64) -> Self {
        if code == HIGH_CLASS_CODE {
            Self::High
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a single prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Raw class code returned by the classifier
    pub class_code: i64,

    /// Category the code maps to
    pub category: WasteCategory,
}

impl PredictionResult {
    #[must_use]
    pub fn from_class_code(class_code: i64) -> Self {
        Self {
            class_code,
            category: WasteCategory::from_class_code(class_code),
        }
    }

    /// Text rendered under the form.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!("Predicted Food Waste Category: {}", self.category)
    }
}

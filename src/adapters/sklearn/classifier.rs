//! Classifiers exported from fitted scikit-learn estimators.
//!
//! The export writes a JSON object tagged by `kind`:
//!
//! - `logistic_regression`: any binary linear decision function
//!   (`coefficients`, `intercept`, `classes`)
//! - `decision_tree`: the estimator's `tree_` arrays
//! - `random_forest`: a list of `tree_` arrays sharing `classes`
//!
//! Prediction mirrors scikit-learn: linear models pick `classes[1]` when the
//! decision value is positive, trees go left when `x[feature] <= threshold`,
//! and forests average per-tree class probabilities before taking the argmax.

use serde::{Deserialize, Serialize};

use crate::adapters::ArtifactError;
use crate::domain::FeatureVector;
use crate::ports::{Classifier, InferenceError};

/// Marker scikit-learn uses for "no child" in `children_left`/`children_right`.
const TREE_LEAF: i64 = -1;

fn binary_classes() -> Vec<i64> {
    vec![0, 1]
}

/// A fitted classifier artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression(LinearModel),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl ClassifierArtifact {
    /// Structural checks run after deserialization.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            Self::LogisticRegression(m) => m.validate(),
            Self::DecisionTree(t) => t.validate(),
            Self::RandomForest(f) => f.validate(),
        }
    }

    /// Short model description for startup logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::LogisticRegression(_) => "logistic_regression".to_string(),
            Self::DecisionTree(t) => format!("decision_tree ({} nodes)", t.nodes.len()),
            Self::RandomForest(f) => format!("random_forest ({} trees)", f.trees.len()),
        }
    }
}

impl Classifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        match self {
            Self::LogisticRegression(m) => m.coefficients.len(),
            Self::DecisionTree(t) => t.n_features,
            Self::RandomForest(f) => f.n_features,
        }
    }

    fn classes(&self) -> &[i64] {
        match self {
            Self::LogisticRegression(m) => &m.classes,
            Self::DecisionTree(t) => &t.classes,
            Self::RandomForest(f) => &f.classes,
        }
    }

    fn predict(&self, scaled: &FeatureVector) -> Result<i64, InferenceError> {
        let expected = self.n_features();
        if scaled.len() != expected {
            return Err(InferenceError::DimensionMismatch {
                expected,
                got: scaled.len(),
            });
        }
        if !scaled.is_finite() {
            return Err(InferenceError::NonFiniteInput);
        }

        let x = scaled.as_slice();
        match self {
            Self::LogisticRegression(m) => Ok(m.predict_row(x)),
            Self::DecisionTree(t) => {
                let leaf = t.nodes.leaf_values(x)?;
                Ok(t.classes[argmax(leaf)])
            }
            Self::RandomForest(f) => f.predict_row(x),
        }
    }
}

/// Binary linear classifier (`coef_`, `intercept_`, `classes_`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
}

impl LinearModel {
    /// Build a 0/1 linear model.
    ///
    /// # Errors
    /// Returns `ArtifactError::Invalid` if the parameters fail validation.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ArtifactError> {
        let model = Self {
            coefficients,
            intercept,
            classes: binary_classes(),
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.is_empty() {
            return Err(ArtifactError::Invalid("linear model has no coefficients".into()));
        }
        if self.classes.len() != 2 {
            return Err(ArtifactError::Invalid(format!(
                "linear model must have exactly 2 classes, got {}",
                self.classes.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::Invalid(
                "linear model parameters must be finite".into(),
            ));
        }
        Ok(())
    }

    fn decision_function(&self, x: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept
    }

    fn predict_row(&self, x: &[f64]) -> i64 {
        if self.decision_function(x) > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        }
    }
}

/// Node arrays of a fitted tree (`estimator.tree_`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNodes {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights, one row per node.
    pub value: Vec<Vec<f64>>,
}

impl TreeNodes {
    fn len(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), ArtifactError> {
        let n = self.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("tree has no nodes".into()));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(ArtifactError::Invalid(
                "tree node arrays have different lengths".into(),
            ));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(ArtifactError::Invalid(format!(
                        "node {node} has exactly one child"
                    )));
                }
                let row = &self.value[node];
                if row.len() != n_classes {
                    return Err(ArtifactError::Invalid(format!(
                        "leaf {node} has {} class weights, expected {n_classes}",
                        row.len()
                    )));
                }
                if row.iter().any(|w| !w.is_finite() || *w < 0.0) || row.iter().sum::<f64>() <= 0.0
                {
                    return Err(ArtifactError::Invalid(format!(
                        "leaf {node} class weights must be non-negative with a positive sum"
                    )));
                }
                continue;
            }

            // Children always follow their parent in scikit-learn's layout,
            // which also rules out cycles during traversal.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(ArtifactError::Invalid(format!(
                        "node {node} has out-of-range child {child}"
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(ArtifactError::Invalid(format!(
                    "node {node} splits on feature {feature}, model has {n_features}"
                )));
            }
            if self.threshold[node].is_nan() {
                return Err(ArtifactError::Invalid(format!(
                    "node {node} has a NaN threshold"
                )));
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf and return its class weights.
    fn leaf_values(&self, x: &[f64]) -> Result<&[f64], InferenceError> {
        let mut node = 0usize;
        for _ in 0..self.len() {
            let left = self.children_left[node];
            if left == TREE_LEAF {
                return Ok(&self.value[node]);
            }
            let feature = self.feature[node] as usize;
            // Fitted trees split on float32 inputs.
            let value = f64::from(x[feature] as f32);
            let next = if value <= self.threshold[node] {
                left
            } else {
                self.children_right[node]
            };
            node = next as usize;
        }
        Err(InferenceError::Model(
            "tree traversal did not reach a leaf".into(),
        ))
    }
}

/// Single decision tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
    pub nodes: TreeNodes,
}

impl DecisionTree {
    fn validate(&self) -> Result<(), ArtifactError> {
        validate_header(self.n_features, &self.classes)?;
        self.nodes.validate(self.n_features, self.classes.len())
    }
}

/// Forest of decision trees with soft voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
    pub trees: Vec<TreeNodes>,
}

impl RandomForest {
    fn validate(&self) -> Result<(), ArtifactError> {
        validate_header(self.n_features, &self.classes)?;
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| ArtifactError::Invalid(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    fn predict_row(&self, x: &[f64]) -> Result<i64, InferenceError> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_values(x)?;
            let total: f64 = leaf.iter().sum();
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }
        Ok(self.classes[argmax(&proba)])
    }
}

fn validate_header(n_features: usize, classes: &[i64]) -> Result<(), ArtifactError> {
    if n_features == 0 {
        return Err(ArtifactError::Invalid("model has no features".into()));
    }
    if classes.is_empty() {
        return Err(ArtifactError::Invalid("model has no classes".into()));
    }
    Ok(())
}

/// Index of the largest value; ties resolve to the first index.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

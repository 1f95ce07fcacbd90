//! scikit-learn adapter: fitted estimators exported as JSON.

mod classifier;
mod scaler;

pub use classifier::{ClassifierArtifact, DecisionTree, LinearModel, RandomForest, TreeNodes};
pub use scaler::ScalingParameters;

//! Prediction service: the request-to-prediction pipeline.
//!
//! raw form values → `CountryIndicators` → feature vector → scaler →
//! classifier → `PredictionResult`.

use std::sync::Arc;

use crate::domain::{
    CountryIndicators, PredictionResult, FEATURE_COUNT, FEATURE_NAMES, HIGH_CLASS_CODE,
};
use crate::ports::{Classifier, FeatureNormalizer};
use crate::WastecastError;

/// Service running the fitted scaler and classifier.
///
/// Holds only shared read-only handles, so it can be cloned into every
/// request handler without locking. Nothing is recorded between calls.
pub struct PredictionService<N, C>
where
    N: FeatureNormalizer,
    C: Classifier,
{
    normalizer: Arc<N>,
    classifier: Arc<C>,
}

impl<N, C> Clone for PredictionService<N, C>
where
    N: FeatureNormalizer,
    C: Classifier,
{
    fn clone(&self) -> Self {
        Self {
            normalizer: Arc::clone(&self.normalizer),
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<N, C> PredictionService<N, C>
where
    N: FeatureNormalizer,
    C: Classifier,
{
    /// Create a new prediction service.
    pub fn new(normalizer: Arc<N>, classifier: Arc<C>) -> Self {
        Self {
            normalizer,
            classifier,
        }
    }

    /// Parse the two form values and predict.
    ///
    /// # Errors
    /// Returns `WastecastError::Input` if a value is missing or not a number,
    /// and `WastecastError::Inference` if scaling or prediction fails.
    pub fn predict_form(
        &self,
        feature1: Option<&str>,
        feature2: Option<&str>,
    ) -> Result<PredictionResult, WastecastError> {
        let indicators = CountryIndicators::parse(feature1, feature2)?;
        self.predict(&indicators)
    }

    /// Scale and classify already-parsed indicators.
    ///
    /// # Errors
    /// Returns `WastecastError::Inference` if the artifacts were fitted on a
    /// different number of features or the scaled row is not finite.
    pub fn predict(
        &self,
        indicators: &CountryIndicators,
    ) -> Result<PredictionResult, WastecastError> {
        tracing::debug!(
            gdp_per_capita = indicators.gdp_per_capita,
            literacy_rate = indicators.literacy_rate,
            "Received input"
        );

        let scaled = self.normalizer.transform(&indicators.to_vector())?;
        tracing::debug!(scaled = ?scaled.as_slice(), "Scaled features");

        let code = self.classifier.predict(&scaled)?;
        let result = PredictionResult::from_class_code(code);
        tracing::info!(class_code = code, category = %result.category, "Prediction complete");

        Ok(result)
    }

    /// Mismatches between the loaded artifacts and what the pipeline assumes.
    ///
    /// None of these stop startup: dimension mismatches fail per request and
    /// the label mapping is applied regardless of the declared classes.
    #[must_use]
    pub fn compatibility_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.normalizer.n_features() != FEATURE_COUNT {
            warnings.push(format!(
                "scaler was fitted on {} features, pipeline supplies {}",
                self.normalizer.n_features(),
                FEATURE_COUNT
            ));
        }
        if self.classifier.n_features() != FEATURE_COUNT {
            warnings.push(format!(
                "classifier was fitted on {} features, pipeline supplies {}",
                self.classifier.n_features(),
                FEATURE_COUNT
            ));
        }
        if let Some(names) = self.normalizer.feature_names() {
            if !names.iter().map(String::as_str).eq(FEATURE_NAMES) {
                warnings.push(format!(
                    "scaler feature order {names:?} differs from expected {FEATURE_NAMES:?}"
                ));
            }
        }

        let mut classes = self.classifier.classes().to_vec();
        classes.sort_unstable();
        if classes != [0, HIGH_CLASS_CODE] {
            warnings.push(format!(
                "classifier classes {:?} are not {{0, 1}}; only code {} maps to High",
                self.classifier.classes(),
                HIGH_CLASS_CODE
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sklearn::{ClassifierArtifact, LinearModel, ScalingParameters};
    use crate::domain::{FeatureVector, WasteCategory};
    use crate::ports::InferenceError;

    /// Classifier that always returns the same code.
    struct FixedClassifier(i64);

    impl Classifier for FixedClassifier {
        fn n_features(&self) -> usize {
            2
        }

        fn classes(&self) -> &[i64] {
            &[0, 1]
        }

        fn predict(&self, _scaled: &FeatureVector) -> Result<i64, InferenceError> {
            Ok(self.0)
        }
    }

    fn identity_scaler() -> Arc<ScalingParameters> {
        Arc::new(ScalingParameters::new(vec![0.0, 0.0], vec![1.0, 1.0]).expect("valid"))
    }

    fn linear_service() -> PredictionService<ScalingParameters, ClassifierArtifact> {
        // High when gdp + literacy > 10 after scaling.
        let scaler = ScalingParameters::new(vec![100.0, 50.0], vec![10.0, 5.0]).expect("valid");
        let model = LinearModel::new(vec![1.0, 1.0], -10.0).expect("valid");
        PredictionService::new(
            Arc::new(scaler),
            Arc::new(ClassifierArtifact::LogisticRegression(model)),
        )
    }

    #[test]
    fn test_scaling_happens_before_prediction() {
        let service = linear_service();
        // scaled = (10, 2) -> 12 - 10 > 0
        let high = service.predict_form(Some("200"), Some("60")).expect("predict");
        assert_eq!(high.category, WasteCategory::High);
        // scaled = (0, 0) -> -10
        let low = service.predict_form(Some("100"), Some("50")).expect("predict");
        assert_eq!(low.category, WasteCategory::Low);
    }

    #[test]
    fn test_label_mapping_through_service() {
        for (code, expected) in [(1, "High"), (0, "Low"), (2, "Low")] {
            let service = PredictionService::new(identity_scaler(), Arc::new(FixedClassifier(code)));
            let result = service
                .predict(&CountryIndicators::new(5.0, 10.0))
                .expect("predict");
            assert_eq!(result.category.label(), expected);
        }
    }

    #[test]
    fn test_parse_error_is_input_error() {
        let err = linear_service()
            .predict_form(Some("abc"), Some("1"))
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_nan_input_is_inference_error() {
        let err = linear_service()
            .predict_form(Some("NaN"), Some("1"))
            .unwrap_err();
        assert!(!err.is_input_error());
        assert!(matches!(
            err,
            WastecastError::Inference(InferenceError::NonFiniteInput)
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_inference_error() {
        let scaler =
            ScalingParameters::new(vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]).expect("valid");
        let service = PredictionService::new(Arc::new(scaler), Arc::new(FixedClassifier(1)));
        let err = service
            .predict(&CountryIndicators::new(1.0, 2.0))
            .unwrap_err();
        assert!(matches!(
            err,
            WastecastError::Inference(InferenceError::DimensionMismatch { .. })
        ));
        assert!(!service.compatibility_warnings().is_empty());
    }

    #[test]
    fn test_repeated_predictions_are_identical() {
        let service = linear_service();
        let first = service.predict_form(Some("150"), Some("55")).expect("predict");
        for _ in 0..5 {
            assert_eq!(
                service.predict_form(Some("150"), Some("55")).expect("predict"),
                first
            );
        }
    }

    #[test]
    fn test_compatibility_warnings() {
        assert!(linear_service().compatibility_warnings().is_empty());

        let scaler = ScalingParameters::new(vec![0.0, 0.0], vec![1.0, 1.0])
            .expect("valid")
            .with_feature_names(vec!["literacy_rate".into(), "gdp_per_capita".into()])
            .expect("valid");
        let model = LinearModel {
            coefficients: vec![1.0, 1.0],
            intercept: 0.0,
            classes: vec![1, 2],
        };
        let service = PredictionService::new(
            Arc::new(scaler),
            Arc::new(ClassifierArtifact::LogisticRegression(model)),
        );
        let warnings = service.compatibility_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("feature order"));
        assert!(warnings[1].contains("not {0, 1}"));
    }
}

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt; // for `oneshot`

use wastecast::adapters::sklearn::{ClassifierArtifact, LinearModel, ScalingParameters};
use wastecast::adapters::ArtifactLoader;
use wastecast::application::PredictionService;
use wastecast::domain::FeatureVector;
use wastecast::ports::{Classifier, InferenceError};
use wastecast::web::{self, GENERIC_ERROR_MESSAGE};

/// Classifier returning a fixed code regardless of input.
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
    Arc::new(ScalingParameters::new(vec![0.0, 0.0], vec![1.0, 1.0]).expect("valid scaler"))
}

/// High exactly when feature1 + feature2 > 0 (identity scaling).
fn linear_app() -> Router {
    let model = LinearModel::new(vec![1.0, 1.0], 0.0).expect("valid model");
    let service = PredictionService::new(
        identity_scaler(),
        Arc::new(ClassifierArtifact::LogisticRegression(model)),
    );
    web::router(service).expect("router")
}

fn shipped_app() -> Router {
    let models = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
    let artifacts = ArtifactLoader::new()
        .load(&models.join("scaler.json"), &models.join("model.json"))
        .expect("load shipped artifacts");
    let service = PredictionService::new(
        Arc::new(artifacts.scaler),
        Arc::new(artifacts.classifier),
    );
    web::router(service).expect("router")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post_form(app: &Router, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn index_renders_form_fields() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&linear_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="feature1""#));
    assert!(body.contains(r#"name="feature2""#));
    assert!(!body.contains("Predicted Food Waste Category"));
    assert!(!body.contains(GENERIC_ERROR_MESSAGE));
}

#[tokio::test]
async fn predict_returns_high_or_low() {
    let app = linear_app();

    let (status, body) = post_form(&app, "feature1=5&feature2=10").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Predicted Food Waste Category: High"));

    let (status, body) = post_form(&app, "feature1=-5&feature2=-10").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Predicted Food Waste Category: Low"));
}

#[tokio::test]
async fn predict_covers_numeric_spread() {
    let app = shipped_app();
    for (f1, f2) in [
        ("0", "0"),
        ("1000", "40"),
        ("60000", "99"),
        ("-1", "250"),
        ("1e9", "1e-9"),
        ("17435.62", "84.71"),
    ] {
        let (status, body) = post_form(&app, &format!("feature1={f1}&feature2={f2}")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            body.contains("Category: High") || body.contains("Category: Low"),
            "no label for ({f1}, {f2})"
        );
    }
}

#[tokio::test]
async fn shipped_artifacts_separate_rich_and_poor() {
    let app = shipped_app();

    let (_, body) = post_form(&app, "feature1=60000&feature2=99").await;
    assert!(body.contains("Predicted Food Waste Category: High"));

    let (_, body) = post_form(&app, "feature1=1000&feature2=40").await;
    assert!(body.contains("Predicted Food Waste Category: Low"));
}

#[tokio::test]
async fn non_numeric_input_shows_generic_error() {
    let (status, body) = post_form(&linear_app(), "feature1=abc&feature2=10").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(GENERIC_ERROR_MESSAGE));
    assert!(!body.contains("abc"));
    assert!(!body.contains("not a number"));
}

#[tokio::test]
async fn missing_field_shows_generic_error() {
    let (status, body) = post_form(&linear_app(), "feature1=10").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(GENERIC_ERROR_MESSAGE));
}

#[tokio::test]
async fn nan_input_shows_generic_error() {
    let (status, body) = post_form(&linear_app(), "feature1=NaN&feature2=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(GENERIC_ERROR_MESSAGE));
}

#[tokio::test]
async fn wrong_content_type_shows_generic_error() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"feature1":"1","feature2":"2"}"#))
        .unwrap();
    let (status, body) = send(&linear_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(GENERIC_ERROR_MESSAGE));
}

#[tokio::test]
async fn dimension_mismatch_shows_generic_error() {
    let scaler = ScalingParameters::new(vec![0.0; 3], vec![1.0; 3]).expect("valid scaler");
    let service = PredictionService::new(Arc::new(scaler), Arc::new(FixedClassifier(1)));
    let app = web::router(service).expect("router");

    let (status, body) = post_form(&app, "feature1=1&feature2=2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(GENERIC_ERROR_MESSAGE));
}

#[tokio::test]
async fn label_mapping_is_fixed() {
    for (code, label) in [(1, "High"), (0, "Low"), (7, "Low")] {
        let service = PredictionService::new(identity_scaler(), Arc::new(FixedClassifier(code)));
        let app = web::router(service).expect("router");

        let (_, body) = post_form(&app, "feature1=5&feature2=10").await;
        assert!(body.contains(&format!("Predicted Food Waste Category: {label}")));
    }
}

#[tokio::test]
async fn identical_requests_get_identical_responses() {
    let app = shipped_app();
    let (_, first) = post_form(&app, "feature1=23000&feature2=91").await;
    for _ in 0..3 {
        let (_, again) = post_form(&app, "feature1=23000&feature2=91").await;
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn get_predict_is_not_allowed() {
    let request = Request::builder()
        .uri("/predict")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&linear_app(), request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

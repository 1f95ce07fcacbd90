//! Web layer: the HTML form and prediction routes.
//!
//! - `GET /` renders the form
//! - `POST /predict` runs the prediction and re-renders the form with the
//!   result, or with a generic error message for any failure

mod handlers;
mod templates;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use handlebars::TemplateError;
use tower_http::trace::TraceLayer;

use crate::application::PredictionService;
use crate::ports::{Classifier, FeatureNormalizer};

pub use handlers::PredictForm;
pub use templates::Templates;

/// The only failure text users ever see.
pub const GENERIC_ERROR_MESSAGE: &str = "Error occurred. Please check your inputs.";

/// Application state shared by every handler.
pub struct AppState<N, C>
where
    N: FeatureNormalizer,
    C: Classifier,
{
    pub service: PredictionService<N, C>,
    pub templates: Arc<Templates>,
}

impl<N, C> Clone for AppState<N, C>
where
    N: FeatureNormalizer,
    C: Classifier,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            templates: Arc::clone(&self.templates),
        }
    }
}

/// Build the application router.
///
/// # Errors
/// Returns `TemplateError` if the form template fails to compile.
pub fn router<N, C>(service: PredictionService<N, C>) -> Result<Router, TemplateError>
where
    N: FeatureNormalizer + 'static,
    C: Classifier + 'static,
{
    let state = AppState {
        service,
        templates: Arc::new(Templates::new()?),
    };

    Ok(Router::new()
        .route("/", get(handlers::index::<N, C>))
        .route("/predict", post(handlers::predict::<N, C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

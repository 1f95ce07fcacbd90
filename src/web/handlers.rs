//! HTTP request handlers

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use crate::ports::{Classifier, FeatureNormalizer};

use super::templates::Templates;
use super::{AppState, GENERIC_ERROR_MESSAGE};

/// Body of `POST /predict`. Fields are optional so a missing one takes the
/// same error path as a malformed one.
#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub feature1: Option<String>,
    pub feature2: Option<String>,
}

/// Handler for GET / - the empty form
pub async fn index<N, C>(State(state): State<AppState<N, C>>) -> Response
where
    N: FeatureNormalizer + 'static,
    C: Classifier + 'static,
{
    render(&state.templates, None)
}

/// Handler for POST /predict - the form with a prediction or the generic error
pub async fn predict<N, C>(
    State(state): State<AppState<N, C>>,
    form: Result<Form<PredictForm>, FormRejection>,
) -> Response
where
    N: FeatureNormalizer + 'static,
    C: Classifier + 'static,
{
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            tracing::warn!("Rejected prediction request body: {}", rejection);
            return render(&state.templates, Some(GENERIC_ERROR_MESSAGE));
        }
    };

    let text = match state
        .service
        .predict_form(form.feature1.as_deref(), form.feature2.as_deref())
    {
        Ok(result) => result.display_text(),
        Err(e) => {
            if e.is_input_error() {
                tracing::warn!("Prediction rejected: {}", e);
            } else {
                tracing::error!("Prediction failed: {}", e);
            }
            GENERIC_ERROR_MESSAGE.to_string()
        }
    };

    render(&state.templates, Some(&text))
}

fn render(templates: &Templates, prediction_text: Option<&str>) -> Response {
    match templates.render_form(prediction_text) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render form: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

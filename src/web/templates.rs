//! HTML rendering for the prediction form.

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

const FORM_TEMPLATE_NAME: &str = "form";

/// The prediction form. `prediction_text` is HTML-escaped by handlebars.
const FORM_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Prediction Form</title>
    <style>
        body {
            background-color: rgb(255,0,0);
            font-family: Arial, sans-serif;
            margin: 0;
            padding: 0;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
        }
        .container {
            background-color: white;
            padding: 20px;
            border-radius: 10px;
            box-shadow: 0px 0px 15px rgba(0, 0, 0, 0.1);
            width: 400px;
        }
        h2 {
            text-align: center;
            color: #333;
        }
        label {
            font-size: 16px;
            margin-bottom: 5px;
            display: block;
            color: #333;
        }
        input[type="number"] {
            width: 100%;
            padding: 10px;
            margin: 10px 0;
            border: 1px solid #ccc;
            border-radius: 5px;
            font-size: 16px;
        }
        input[type="submit"] {
            background-color: #007bff;
            color: white;
            border: none;
            padding: 12px 20px;
            text-align: center;
            font-size: 16px;
            border-radius: 5px;
            cursor: pointer;
            width: 100%;
        }
        input[type="submit"]:hover {
            background-color: #0056b3;
        }
        .prediction-text {
            text-align: center;
            font-size: 18px;
            margin-top: 20px;
            font-weight: bold;
        }
    </style>
</head>
<body>

    <div class="container">
        <h2>Enter Feature Values for Prediction</h2>
        <form method="POST" action="/predict">
            <label for="feature1">GDP per capita (in USD):</label>
            <input type="number" step="any" id="feature1" name="feature1" required><br>

            <label for="feature2">Literacy Rate (in %):</label>
            <input type="number" step="any" id="feature2" name="feature2" required><br>

            <input type="submit" value="Predict">
        </form>
{{#if prediction_text}}
        <div class="prediction-text">
            <p>{{prediction_text}}</p>
        </div>
{{/if}}
    </div>

</body>
</html>
"#;

#[derive(Serialize)]
struct FormContext<'a> {
    prediction_text: Option<&'a str>,
}

/// Compiled page templates, built once at startup.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    /// Compile all templates.
    ///
    /// # Errors
    /// Returns `TemplateError` if a template fails to parse.
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(FORM_TEMPLATE_NAME, FORM_TEMPLATE)?;
        Ok(Self { registry })
    }

    /// Render the form, optionally with a result line below it.
    ///
    /// # Errors
    /// Returns `RenderError` if rendering fails.
    pub fn render_form(&self, prediction_text: Option<&str>) -> Result<String, RenderError> {
        self.registry
            .render(FORM_TEMPLATE_NAME, &FormContext { prediction_text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_has_named_inputs() {
        let html = Templates::new().expect("compile").render_form(None).expect("render");
        assert!(html.contains(r#"name="feature1""#));
        assert!(html.contains(r#"name="feature2""#));
        assert!(html.contains(r#"action="/predict""#));
        assert!(!html.contains("prediction-text\">"));
    }

    #[test]
    fn test_prediction_text_is_rendered() {
        let html = Templates::new()
            .expect("compile")
            .render_form(Some("Predicted Food Waste Category: High"))
            .expect("render");
        assert!(html.contains("<p>Predicted Food Waste Category: High</p>"));
    }

    #[test]
    fn test_prediction_text_is_escaped() {
        let html = Templates::new()
            .expect("compile")
            .render_form(Some("<script>alert(1)</script>"))
            .expect("render");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}

//! HTML rendering for the upload page and results.
//!
//! Templates are `.html`, so minijinja auto-escapes every value.

use minijinja::{context, Environment};
use serde::Serialize;

use toonspot_core::{BatchItem, ItemOutcome};

const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Cartoon Detection AI App 💩👺</title>
<style>
body{font-family:system-ui,sans-serif;max-width:760px;margin:2rem auto;padding:0 1rem;color:#222}
form{display:flex;flex-direction:column;gap:1rem;margin-bottom:2rem}
.item{border-top:1px solid #ddd;padding:1rem 0}
.item img{max-width:100%;display:block;margin-bottom:.5rem}
.detected{color:#146c2e}.none{color:#555}.error{color:#b3261e}
</style></head>
<body><h1>Cartoon Detection AI App 💩👺</h1>
<p>Upload an image, and the app will detect animated characters!!</p>
{% block body %}{% endblock %}
</body></html>
"#;

const FORM: &str = r#"<form action="/classify" method="post" enctype="multipart/form-data">
<label>Set Confidence Threshold: <output id="threshold-value">{{ threshold }}</output>
<input type="range" name="threshold" min="0" max="1" step="0.01" value="{{ threshold }}"
 oninput="document.getElementById('threshold-value').value=Number(this.value).toFixed(2)"></label>
<label>Upload images of animated characters
<input type="file" name="files" accept=".jpg,.jpeg,.png" multiple required></label>
<button type="submit">Detect</button></form>
"#;

const INDEX: &str = r#"{% extends "layout.html" %}
{% block body %}{% include "form.html" %}{% endblock %}"#;

const RESULTS: &str = r#"{% extends "layout.html" %}
{% block body %}
{% for item in items %}<section class="item"><h3>{{ item.name }}</h3>
{% if item.preview %}<img src="{{ item.preview }}" alt="Uploaded Image" title="Uploaded Image">{% endif %}
<p class="{{ item.status }}">{{ item.message }}</p></section>
{% endfor %}
{% include "form.html" %}
{% endblock %}"#;

const ERROR: &str = r#"{% extends "layout.html" %}
{% block body %}<p class="error">Error: {{ message }}</p>{% include "form.html" %}{% endblock %}"#;

/// One result row as the template sees it.
#[derive(Serialize)]
struct ResultRow<'a> {
    name: &'a str,
    preview: Option<&'a str>,
    status: &'static str,
    message: String,
}

impl<'a> From<&'a BatchItem> for ResultRow<'a> {
    fn from(item: &'a BatchItem) -> Self {
        let status = match item.outcome {
            ItemOutcome::Detected(_) => "detected",
            ItemOutcome::NoMatch => "none",
            ItemOutcome::Failed { .. } => "error",
        };
        Self {
            name: &item.name,
            preview: item.preview.as_deref(),
            status,
            message: outcome_message(item),
        }
    }
}

/// The page templates, compiled once at startup.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("layout.html", LAYOUT)?;
        env.add_template("form.html", FORM)?;
        env.add_template("index.html", INDEX)?;
        env.add_template("results.html", RESULTS)?;
        env.add_template("error.html", ERROR)?;
        Ok(Self { env })
    }

    /// The upload page.
    pub fn index(&self, threshold: f32) -> Result<String, minijinja::Error> {
        self.env
            .get_template("index.html")?
            .render(context! { threshold => format!("{threshold:.2}") })
    }

    /// Results for a batch, followed by the form for another round.
    pub fn results(&self, items: &[BatchItem], threshold: f32) -> Result<String, minijinja::Error> {
        let rows: Vec<ResultRow> = items.iter().map(ResultRow::from).collect();
        self.env.get_template("results.html")?.render(context! {
            items => rows,
            threshold => format!("{threshold:.2}"),
        })
    }

    /// A page for request-level errors (bad form data, too many files).
    pub fn error(&self, message: &str, threshold: f32) -> Result<String, minijinja::Error> {
        self.env.get_template("error.html")?.render(context! {
            message => message,
            threshold => format!("{threshold:.2}"),
        })
    }
}

/// Message shown for one item, matching the wording of the upload page.
pub fn outcome_message(item: &BatchItem) -> String {
    match &item.outcome {
        ItemOutcome::Detected(d) => format!(
            "Detected Character: {} (Confidence: {:.2})",
            d.label, d.confidence
        ),
        ItemOutcome::NoMatch => "No character met the confidence threshold.".to_string(),
        ItemOutcome::Failed { message, .. } => match &item.error {
            Some(e) if e.is_invalid_image() => {
                "Error: The uploaded file is not a valid image.".to_string()
            }
            _ => format!("Unexpected error occurred: {message}"),
        },
    }
}

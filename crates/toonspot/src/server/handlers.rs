//! Request handlers.

use std::fmt;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;

use toonspot_core::decode::content_hash;
use toonspot_core::{BatchItem, BatchSummary, ClassifyError, Upload};

use super::AppState;

/// A request-level failure. Per-file failures never become one of these.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn internal(message: impl fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }

    fn from_multipart(e: MultipartError) -> Self {
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Parsed upload form.
struct UploadForm {
    threshold: f32,
    uploads: Vec<Upload>,
}

/// Read the `threshold` field and every `files` part.
///
/// Empty file parts (a form submitted without a selection) are skipped.
async fn read_form(state: &AppState, mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let settings = &state.inner;
    let mut threshold = settings.default_threshold;
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from_multipart)?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "threshold" => {
                let text = field.text().await.map_err(ApiError::from_multipart)?;
                threshold = text
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|t| (0.0..=1.0).contains(t))
                    .ok_or_else(|| {
                        ApiError::bad_request(format!(
                            "threshold must be a number between 0.0 and 1.0, got {:?}",
                            text
                        ))
                    })?;
            }
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(ApiError::from_multipart)?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if uploads.len() >= settings.max_files {
                    return Err(ApiError::bad_request(format!(
                        "Too many files: at most {} per upload",
                        settings.max_files
                    )));
                }
                let name = if file_name.is_empty() {
                    format!("upload-{}", uploads.len() + 1)
                } else {
                    file_name
                };
                uploads.push(Upload::new(name, bytes.to_vec()));
            }
            other => tracing::debug!("Ignoring form field {:?}", other),
        }
    }

    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    Ok(UploadForm { threshold, uploads })
}

/// A timed-out item whose blocking task is still running, possibly while
/// holding the model.
struct Abandoned {
    name: String,
    task: JoinHandle<BatchItem>,
}

impl Abandoned {
    /// Wait until the task finishes and log the result that came too late.
    async fn settle(self) {
        match self.task.await {
            Ok(item) => tracing::debug!(
                "Discarded late result for {}: {:?}",
                self.name,
                item.outcome
            ),
            Err(e) => tracing::warn!("Timed-out task for {} failed: {}", self.name, e),
        }
    }
}

/// Classify uploads one by one on the blocking pool.
///
/// Each item gets its own timeout and error boundary. A timed-out task is
/// settled before the next item starts, so the next item's clock never
/// runs while it waits for the model.
async fn run_batch(state: &AppState, uploads: Vec<Upload>, threshold: f32) -> Vec<BatchItem> {
    let settings = &state.inner;
    let mut items = Vec::with_capacity(uploads.len());
    let mut abandoned: Option<Abandoned> = None;

    for upload in uploads {
        if let Some(late) = abandoned.take() {
            late.settle().await;
        }

        let name = upload.name.clone();
        let hash = content_hash(&upload.bytes);
        let state = state.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            let settings = &state.inner;
            settings
                .runner
                .run_one(&upload, settings.labels, threshold)
        });

        let item = match tokio::time::timeout(settings.item_timeout, &mut task).await {
            Ok(Ok(item)) => item,
            Ok(Err(e)) => BatchItem::failed(
                name,
                hash,
                ClassifyError::inference(format!("Task join error: {e}")),
            ),
            Err(_) => {
                tracing::warn!("Timed out classifying {}", name);
                abandoned = Some(Abandoned {
                    name: name.clone(),
                    task,
                });
                let error = ClassifyError::Timeout {
                    name: name.clone(),
                    timeout_ms: settings.item_timeout.as_millis() as u64,
                };
                BatchItem::failed(name, hash, error)
            }
        };
        items.push(item);
    }

    // The response does not wait for a trailing timeout.
    if let Some(late) = abandoned {
        tokio::spawn(late.settle());
    }

    let summary = BatchSummary::of(&items);
    tracing::info!(
        "Classified {} upload(s): {} detected, {} below threshold, {} failed",
        items.len(),
        summary.detected,
        summary.no_match,
        summary.failed
    );

    items
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let settings = &state.inner;
    settings
        .pages
        .index(settings.default_threshold)
        .map(Html)
        .map_err(ApiError::internal)
}

/// `POST /classify` - multipart form in, HTML results out.
pub async fn classify_page(State(state): State<AppState>, multipart: Multipart) -> Response {
    let settings = &state.inner;
    let (status, rendered) = match read_form(&state, multipart).await {
        Ok(form) => {
            let items = run_batch(&state, form.uploads, form.threshold).await;
            (StatusCode::OK, settings.pages.results(&items, form.threshold))
        }
        Err(e) => (
            e.status,
            settings.pages.error(&e.message, settings.default_threshold),
        ),
    };

    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => ApiError::internal(e).into_response(),
    }
}

/// JSON body of `POST /api/classify`.
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub model: String,
    pub threshold: f32,
    pub summary: BatchSummary,
    pub results: Vec<BatchItem>,
}

/// `POST /api/classify` - multipart form in, JSON out.
pub async fn classify_api(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let form = read_form(&state, multipart).await?;
    let mut results = run_batch(&state, form.uploads, form.threshold).await;
    for item in &mut results {
        item.preview = None;
    }

    Ok(Json(ClassifyResponse {
        model: state.inner.runner.classifier().model_name().to_string(),
        threshold: form.threshold,
        summary: BatchSummary::of(&results),
        results,
    }))
}

/// `GET /api/labels`
pub async fn labels(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "labels": state.inner.labels }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": toonspot_core::VERSION,
        "model": state.inner.runner.classifier().model_name(),
        "labels": state.inner.labels.len(),
    }))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use toonspot_core::config::LimitsConfig;
    use toonspot_core::image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use toonspot_core::{BatchRunner, Classifier, ImageDecoder, Preview, SimilarityModel};

    use super::super::{body_limit, router};
    use super::*;

    const BOUNDARY: &str = "toonspot-test-boundary";
    const ABC: &[&str] = &["A", "B", "C"];

    struct FixedScores(Vec<f32>);

    impl SimilarityModel for FixedScores {
        fn name(&self) -> &str {
            "fixed"
        }

        fn score(&self, _: &DynamicImage, _: &[&str]) -> Result<Vec<f32>, ClassifyError> {
            Ok(self.0.clone())
        }
    }

    /// Holds a lock while scoring, like the ONNX sessions do. White images
    /// take longer than the item timeout.
    struct SlowOnWhite {
        session: Mutex<()>,
        slow: Duration,
    }

    impl SimilarityModel for SlowOnWhite {
        fn name(&self) -> &str {
            "slow-on-white"
        }

        fn score(&self, image: &DynamicImage, _: &[&str]) -> Result<Vec<f32>, ClassifyError> {
            let _session = self.session.lock().unwrap();
            let white = image.to_rgb8().get_pixel(0, 0)[0] == 255;
            std::thread::sleep(if white {
                self.slow
            } else {
                Duration::from_millis(20)
            });
            Ok(vec![1.0, 0.0, 0.0])
        }
    }

    fn app_with(model: Arc<dyn SimilarityModel>, limits: LimitsConfig) -> axum::Router {
        let runner = BatchRunner::new(Classifier::new(model), ImageDecoder::new(limits.clone()))
            .with_preview(Preview::new(16));
        let state = AppState::new(runner, ABC, 0.5, &limits).unwrap();
        router(state, body_limit(&limits))
    }

    fn app(scores: &[f32], limits: LimitsConfig) -> axum::Router {
        app_with(Arc::new(FixedScores(scores.to_vec())), limits)
    }

    fn filled_png(color: Rgb<u8>) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, color));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn png() -> Vec<u8> {
        filled_png(Rgb([0, 0, 0]))
    }

    /// Build a multipart body from (field, optional file name, bytes) parts.
    fn multipart(parts: &[(&str, Option<&str>, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, file_name, bytes) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn post(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn api_reports_each_file_and_keeps_going() {
        let body = multipart(&[
            ("threshold", None, b"0.5".to_vec()),
            ("files", Some("one.png"), png()),
            ("files", Some("notes.txt"), b"not an image".to_vec()),
            ("files", Some("two.png"), png()),
        ]);

        let response = app(&[0.2, 0.7, 0.1], LimitsConfig::default())
            .oneshot(post("/api/classify", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["status"], "detected");
        assert_eq!(results[0]["label"], "B");
        assert_eq!(results[1]["status"], "failed");
        assert_eq!(results[1]["kind"], "invalid_image");
        assert_eq!(results[2]["status"], "detected");
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["model"], "fixed");
        assert!(results[0].get("preview").is_none());
    }

    #[tokio::test]
    async fn slow_item_times_out_without_starving_the_rest() {
        let limits = LimitsConfig {
            item_timeout_ms: 300,
            ..LimitsConfig::default()
        };
        let model = Arc::new(SlowOnWhite {
            session: Mutex::new(()),
            slow: Duration::from_millis(900),
        });
        let body = multipart(&[
            ("files", Some("slow.png"), filled_png(Rgb([255, 255, 255]))),
            ("files", Some("one.png"), png()),
            ("files", Some("two.png"), png()),
        ]);

        let response = app_with(model, limits)
            .oneshot(post("/api/classify", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results[0]["status"], "failed");
        assert_eq!(results[0]["kind"], "timeout");
        assert_eq!(results[1]["status"], "detected");
        assert_eq!(results[1]["label"], "A");
        assert_eq!(results[2]["status"], "detected");
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["summary"]["detected"], 2);
    }

    #[tokio::test]
    async fn api_threshold_above_best_score_is_no_match() {
        let body = multipart(&[
            ("threshold", None, b"0.8".to_vec()),
            ("files", Some("one.png"), png()),
        ]);

        let response = app(&[0.2, 0.7, 0.1], LimitsConfig::default())
            .oneshot(post("/api/classify", body))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["threshold"], 0.8);
        assert_eq!(json["results"][0]["status"], "no_match");
    }

    #[tokio::test]
    async fn api_rejects_bad_threshold() {
        let body = multipart(&[
            ("threshold", None, b"1.5".to_vec()),
            ("files", Some("one.png"), png()),
        ]);

        let response = app(&[0.2, 0.7, 0.1], LimitsConfig::default())
            .oneshot(post("/api/classify", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("threshold"));
    }

    #[tokio::test]
    async fn api_rejects_empty_upload_and_too_many_files() {
        let limits = LimitsConfig {
            max_files_per_request: 1,
            ..LimitsConfig::default()
        };

        let body = multipart(&[("files", Some(""), Vec::new())]);
        let response = app(&[1.0, 0.0, 0.0], limits.clone())
            .oneshot(post("/api/classify", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = multipart(&[
            ("files", Some("a.png"), png()),
            ("files", Some("b.png"), png()),
        ]);
        let response = app(&[1.0, 0.0, 0.0], limits)
            .oneshot(post("/api/classify", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn page_renders_results_with_preview() {
        let body = multipart(&[
            ("threshold", None, b"0.5".to_vec()),
            ("files", Some("one.png"), png()),
            ("files", Some("bad.png"), b"garbage".to_vec()),
        ]);

        let response = app(&[0.5, 0.5, 0.0], LimitsConfig::default())
            .oneshot(post("/classify", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Detected Character: A (Confidence: 0.50)"));
        assert!(html.contains("Error: The uploaded file is not a valid image."));
        assert!(html.contains("<img src=\"data:image"));
    }

    #[tokio::test]
    async fn index_labels_and_health() {
        let app = app(&[1.0, 0.0, 0.0], LimitsConfig::default());

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Set Confidence Threshold"));

        let response = app
            .clone()
            .oneshot(Request::get("/api/labels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["labels"][1], "B");

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["labels"], 3);
    }
}

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::warn;

use scaleslip_pipeline::{SlipFailure, SlipPipeline, SlipReceipt, SlipUpload};

/// Multipart field carrying the slip image.
pub const FILE_FIELD: &str = "file";

/// Shared application state for API handlers.
pub struct AppState {
    pub pipeline: Arc<SlipPipeline>,
}

/// Build the Axum router: the upload endpoint at `route` plus health.
pub fn build_router(state: Arc<AppState>, route: &str, body_limit: usize) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(route, post(upload_slip))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let settings = state.pipeline.settings();
    Json(json!({
        "status": "ok",
        "service": "scaleslip",
        "version": env!("CARGO_PKG_VERSION"),
        "oracle": state.pipeline.oracle_name(),
        "model": settings.model,
        "worksheet": settings.worksheet.title,
    }))
}

/// Body of a successful submission.
pub fn success_body(receipt: &SlipReceipt) -> Value {
    json!({
        "status": "ok",
        "message": "Success",
        "extracted_data": receipt.record,
        "drive_file_link": receipt.stored.web_view_link,
        "drive_file_id": receipt.stored.id,
    })
}

/// Body of a failed submission.
pub fn failure_body(failure: &SlipFailure) -> Value {
    json!({
        "status": "error",
        "detail": failure.to_string(),
        "stage": failure.stage(),
        "row_persisted": failure.progress.row_appended,
    })
}

/// Errors surfaced by the upload handler.
pub enum ApiError {
    /// The request itself is unusable (no file part, broken multipart).
    BadRequest(String),
    Pipeline(SlipFailure),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "detail": detail })),
            )
                .into_response(),
            ApiError::Pipeline(failure) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(failure_body(&failure))).into_response()
            }
        }
    }
}

/// Accept one slip image as multipart form field `file`.
async fn upload_slip(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file part: {e}")))?;
        upload = Some(SlipUpload::new(filename, bytes));
        break;
    }

    let Some(upload) = upload else {
        warn!("Upload without a file part");
        return Err(ApiError::BadRequest(format!(
            "Missing multipart field '{FILE_FIELD}'"
        )));
    };

    let receipt = state.pipeline.submit(upload).await.map_err(ApiError::Pipeline)?;
    Ok(Json(success_body(&receipt)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use scaleslip_archive::InMemoryArchiveStore;
    use scaleslip_core::WorksheetRef;
    use scaleslip_ledger::InMemoryWorksheetStore;
    use scaleslip_pipeline::PipelineSettings;
    use scaleslip_understanding::MockOracle;
    use tower::ServiceExt;

    const BOUNDARY: &str = "slipboundary";

    fn app(oracle: MockOracle, archive: InMemoryArchiveStore) -> Router {
        let pipeline = SlipPipeline::new(
            Arc::new(oracle),
            Arc::new(InMemoryWorksheetStore::new()),
            Arc::new(archive),
            PipelineSettings::new(WorksheetRef::new("sheet", "West")),
        );
        build_router(
            Arc::new(AppState {
                pipeline: Arc::new(pipeline),
            }),
            "/lpdawson",
            1024 * 1024,
        )
    }

    fn reply_oracle() -> MockOracle {
        MockOracle::new("mock").with_response(
            r#"[["Weigh Scale Load Slip #", "194647 / 1"], ["Date In", "08/Sep/25"], ["Net", "30"]]"#,
        )
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/lpdawson")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(reply_oracle(), InMemoryArchiveStore::new())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["worksheet"], "West");
    }

    #[tokio::test]
    async fn upload_returns_record_and_link() {
        let response = app(reply_oracle(), InMemoryArchiveStore::new())
            .oneshot(multipart_request("file", "slip.jpg", b"jpeg"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Success");
        assert_eq!(
            body["extracted_data"],
            json!([
                ["Weigh Scale Load Slip #", "194647 / 1"],
                ["Date In", "08/Sep/25"],
                ["Net", "30"]
            ])
        );
        assert_eq!(body["drive_file_id"], "mem-1");
        assert_eq!(body["drive_file_link"], "memory://archive/mem-1");
    }

    #[tokio::test]
    async fn unsupported_extension_is_intake_error() {
        let response = app(reply_oracle(), InMemoryArchiveStore::new())
            .oneshot(multipart_request("file", "slip.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["stage"], "intake");
        assert_eq!(body["detail"], "Unsupported image type: .pdf");
        assert_eq!(body["row_persisted"], false);
    }

    #[tokio::test]
    async fn archive_failure_reports_persisted_row() {
        let response = app(reply_oracle(), InMemoryArchiveStore::new().fail_create())
            .oneshot(multipart_request("file", "slip.png", b"png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["stage"], "archival");
        assert_eq!(body["row_persisted"], true);
    }

    #[tokio::test]
    async fn missing_file_part_is_bad_request() {
        let response = app(reply_oracle(), InMemoryArchiveStore::new())
            .oneshot(multipart_request("photo", "slip.jpg", b"jpeg"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].as_str().unwrap().contains("file"));
    }
}

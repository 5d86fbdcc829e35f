//! HTTP endpoints.
//!
//! - `POST /api/process-document`: run one invocation
//! - `GET /api/templates`: registered template variants
//! - `GET /outputs/{name}`: download a generated document
//! - `GET /health`

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use docforge_core::archive::DOCX_CONTENT_TYPE;
use docforge_core::error::DocforgeError;
use docforge_core::pipeline::{DocumentService, ProcessRequest, ProcessResponse};
use docforge_core::storage::LocalBucket;
use docforge_core::variant::VariantSummary;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    service: Arc<DocumentService>,
    bucket: Arc<LocalBucket>,
}

impl AppState {
    pub fn new(service: DocumentService, bucket: Arc<LocalBucket>) -> Self {
        Self {
            service: Arc::new(service),
            bucket,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/process-document", post(process_document))
        .route("/api/templates", get(list_templates))
        .route("/outputs/{name}", get(download_output))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// A failed invocation, rendered as `{ success: false, error }`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<DocforgeError> for ApiError {
    fn from(err: DocforgeError) -> Self {
        let status = match &err {
            DocforgeError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            DocforgeError::InvalidTemplateKey(_) => StatusCode::BAD_REQUEST,
            DocforgeError::UnknownVariant(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = ?err, "document processing failed");
        } else {
            tracing::info!(error = %err, "request rejected");
        }
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// POST /api/process-document
async fn process_document(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: rejection.body_text(),
    })?;
    let response = state.service.process(&request).await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<VariantSummary>,
}

/// GET /api/templates
async fn list_templates(State(state): State<AppState>) -> Json<TemplateListResponse> {
    Json(TemplateListResponse {
        templates: state.service.registry().list(),
    })
}

#[derive(Debug, Deserialize)]
struct LinkQuery {
    expires: Option<i64>,
    signature: Option<String>,
}

/// GET /outputs/{name}
async fn download_output(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(link): Query<LinkQuery>,
) -> Result<Response, StatusCode> {
    let path = format!("outputs/{name}");
    let now = chrono::Utc::now().timestamp();
    if !state
        .bucket
        .verify_link(&path, link.expires, link.signature.as_deref(), now)
    {
        return Err(StatusCode::FORBIDDEN);
    }
    let bytes = state.bucket.read(&path).await.map_err(|e| {
        tracing::debug!(path, error = %e, "output not readable");
        StatusCode::NOT_FOUND
    })?;
    let disposition = format!("attachment; filename=\"{name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

use axum::{
    extract::{DefaultBodyLimit, Json, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    app_state::AppState,
    ingest::{self, IngestionSummary},
    models::{ApiResponse, QueryRequest},
    rag::{self, QueryOutcome},
};

/// Tamaño máximo aceptado para una subida.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

// --- Conversión de resultados a la respuesta uniforme ---

impl From<IngestionSummary> for ApiResponse {
    fn from(summary: IngestionSummary) -> Self {
        ApiResponse::Uploaded {
            filename: summary.filename,
            chunks: summary.chunks_created,
        }
    }
}

impl From<QueryOutcome> for ApiResponse {
    fn from(outcome: QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Answered { question, answer } => {
                ApiResponse::Answered { question, answer }
            }
            QueryOutcome::NoResults => ApiResponse::no_results(),
            QueryOutcome::LlmDisabled { question, answer } => {
                ApiResponse::LlmDisabled { question, answer }
            }
        }
    }
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/upload", post(upload_handler))
        .route("/query", post(query_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[axum::debug_handler]
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    let unprocessable = |message: String| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::Error {
                message,
                question: None,
            }),
        )
    };

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| {
                warn!("Multipart inválido: {e}");
                unprocessable(format!("Invalid multipart body: {e}"))
            })?
            .ok_or_else(|| unprocessable("Missing 'file' field".to_string()))?;

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| unprocessable(format!("Could not read uploaded file: {e}")))?
            .to_vec();

        let response = match ingest::ingest_document(&state, &filename, content).await {
            Ok(summary) => ApiResponse::from(summary),
            Err(err) => ApiResponse::from(err),
        };
        return Ok(Json(response));
    }
}

#[axum::debug_handler]
async fn query_handler(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Json<ApiResponse> {
    let response = match rag::answer_query(&state, &payload.question).await {
        Ok(outcome) => ApiResponse::from(outcome),
        Err(err) => ApiResponse::from(err),
    };
    Json(response)
}

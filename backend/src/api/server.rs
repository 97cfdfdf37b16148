//! HTTP Server for the periodshift API.
//!
//! # API Endpoints
//!
//! | Method | Path                | Description                               |
//! |--------|---------------------|-------------------------------------------|
//! | GET    | `/health`           | Health check                              |
//! | POST   | `/api/convert`      | Multipart CSV `file` + JSON `plan`        |
//! | POST   | `/api/convert/json` | JSON `{ table, plan }`                    |
//! | GET    | `/api/logs`         | SSE stream for real-time logs             |

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ConvertJsonRequest, ConvertResponse};
use crate::config::MAX_UPLOAD_SIZE;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::parser::ParseOptions;
use crate::transform::pipeline::{convert_bytes, convert_table};
use crate::transform::plan::ConversionPlan;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(
                PipelineError::Csv(_)
                | PipelineError::Conversion(_)
                | PipelineError::InvalidPlan(_)
                | PipelineError::Json(_)
                | PipelineError::EmptyInput,
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match &self {
            ServerError::Pipeline(e) => e.to_string(),
            other => other.to_string(),
        };
        log_error(&message);
        (status, Json(error_response(&message))).into_response()
    }
}

/// Build the application router.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert_upload))
        .route("/api/convert/json", post(convert_json))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 Periodshift server running on http://localhost:{}", port);
    eprintln!("   POST /api/convert      - Convert a CSV upload");
    eprintln!("   POST /api/convert/json - Convert a JSON table");
    eprintln!("   GET  /api/logs         - SSE log stream");
    eprintln!("   GET  /health           - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "periodshift",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "POST /api/convert",
            "convertJson": "POST /api/convert/json",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Multipart upload: `file` holds the CSV, `plan` the conversion plan JSON.
async fn convert_upload(mut multipart: Multipart) -> ServerResult<Json<ConvertResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut plan_json: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "plan" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                plan_json = Some(text);
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let plan_json = plan_json.ok_or_else(|| ServerError::BadRequest("No plan provided".into()))?;
    let plan = ConversionPlan::from_json(&plan_json)?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let report = tokio::task::spawn_blocking(move || {
        convert_bytes(&bytes, &ParseOptions::default(), &plan)
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(ConvertResponse::from(report)))
}

/// JSON body: `{ "table": {...}, "plan": {...} }`.
async fn convert_json(Json(request): Json<ConvertJsonRequest>) -> ServerResult<Json<ConvertResponse>> {
    let plan = ConversionPlan::from_value(request.plan)?;
    let table = request.table;

    let report = tokio::task::spawn_blocking(move || convert_table(table, &plan))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(ConvertResponse::from(report)))
}

//! HTTP front end - POST /execute streams a run as server-sent events

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use loginswarm_common::{RunEvent, SwarmError};
use loginswarm_orchestrator::{validate_num_logins, Orchestrator};

pub async fn serve(bind: &str, orchestrator: Orchestrator) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

pub fn router(orchestrator: Orchestrator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/execute", post(execute))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn execute(
    State(orchestrator): State<Orchestrator>,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let requested = body
        .as_ref()
        .and_then(|Json(v)| v.get("num_logins"))
        .cloned()
        .unwrap_or(Value::Null);
    let num_logins = validate_num_logins(&requested)?;

    let stream = orchestrator.start_run(num_logins)?;
    let events = ReceiverStream::new(stream.into_inner()).map(|event| Ok::<Event, Infallible>(render_event(&event)));

    let mut response = Sse::new(events).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(response)
}

fn render_event(event: &RunEvent) -> Event {
    match event.to_json() {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            error!("Failed to encode {} event: {}", event.kind(), e);
            Event::default().comment("encoding error")
        }
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SwarmError> for ApiError {
    fn from(err: SwarmError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Run could not start: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = Json(serde_json::json!({
            "error": self.message,
        }))
        .into_response();
        *response.status_mut() = self.status;
        response
    }
}

//! HTTP front door for hassist.
//!
//! Exposes the conversation endpoint plus read-only introspection of the
//! tool catalog and the exposed entities. Domain events stream out over
//! SSE at `/v1/events`. Built on Axum.

pub mod runtime;

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Query};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, header},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use hassist_agent::{ConversationResponse, SessionManager};
use hassist_core::platform::ExposedEntity;
use hassist_core::provider::ToolDefinition;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub sessions: Arc<SessionManager>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/conversation/process", post(process_handler))
        .route("/v1/tools", get(tools_handler))
        .route("/v1/entities", get(entities_handler))
        .route("/v1/events", get(events_handler))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: hassist_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let sessions = runtime::session_manager(&config).await?;
    let app = build_router(Arc::new(GatewayState { sessions }));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ProcessRequest {
    text: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

fn default_language() -> String {
    "en".into()
}

async fn process_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ProcessRequest>,
) -> Result<Json<ConversationResponse>, StatusCode> {
    if payload.text.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    info!(
        text_len = payload.text.len(),
        conversation_id = payload.conversation_id.as_deref().unwrap_or("-"),
        "Conversation request received"
    );

    let response = state
        .sessions
        .process(
            payload.conversation_id.as_deref(),
            &payload.text,
            &payload.language,
        )
        .await;
    Ok(Json(response))
}

async fn tools_handler(State(state): State<SharedState>) -> Json<Vec<ToolDefinition>> {
    Json(state.sessions.executor().tools().definitions())
}

#[derive(Deserialize)]
struct EntityQuery {
    area_id: Option<String>,
    domain: Option<String>,
}

async fn entities_handler(
    State(state): State<SharedState>,
    Query(query): Query<EntityQuery>,
) -> Result<Json<Vec<ExposedEntity>>, StatusCode> {
    state
        .sessions
        .executor()
        .gateway()
        .list_exposed_entities(query.area_id.as_deref(), query.domain.as_deref())
        .await
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "Failed to list exposed entities");
            StatusCode::SERVICE_UNAVAILABLE
        })
}

/// `GET /v1/events`: SSE stream of published domain events.
async fn events_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.sessions.executor().event_bus().subscribe();
    let stream = BroadcastStream::new(rx)
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Event stream lagged, events dropped");
                None
            }
        })
        .map(|event| {
            let data = serde_json::to_string(event.as_ref()).unwrap_or_default();
            Ok(SseEvent::default().event(event.kind()).data(data))
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

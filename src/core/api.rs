//! HTTP API for readings and stats
//!
//! Endpoints:
//! - POST /api/tarot/reading - Stream a tarot reading
//! - POST /api/iching/divination - Stream an I Ching reading
//! - GET /api/stats - Current visit and usage counters
//! - POST /api/stats/increment - Count a page view
//! - GET /health - Health check
//!
//! Reading endpoints answer `text/event-stream`; every event is one
//! `data: <json>` line and the last one is `data: [DONE]` or an error.

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::HeaderMap,
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use futures_util::stream::{BoxStream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::core::analytics::Analytics;
use crate::core::counter::CounterStore;
use crate::core::prompt::Prompt;
use crate::core::relay::relay;
use crate::core::upstream::CompletionProvider;
use crate::error::ApiError;
use crate::types::{
    IChingReadingRequest, PageViewRequest, PageViewResponse, StatsSnapshot, TarotReadingRequest,
};

/// App state
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub analytics: Analytics,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create the API router
pub fn create_router(provider: Arc<dyn CompletionProvider>, store: Arc<dyn CounterStore>) -> Router {
    let state = AppState {
        provider,
        analytics: Analytics::new(store),
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/tarot/reading", post(tarot_reading))
        .route("/api/iching/divination", post(iching_divination))
        .route("/api/stats", get(get_stats))
        .route("/api/stats/increment", post(increment_page_view))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

type EventStream = Sse<BoxStream<'static, Result<Event, Infallible>>>;

/// Count the call, open upstream, relay as SSE.
/// Callers validate first, so a rejected request is never counted.
async fn stream_reading(state: &AppState, prompt: Prompt) -> Result<EventStream, ApiError> {
    state.analytics.record_call(prompt.kind).await;
    let upstream = state.provider.open_stream(prompt.system, &prompt.user).await?;
    debug!(kind = %prompt.kind, "relaying reading");

    let events = relay(upstream).map(|event| Ok::<_, Infallible>(Event::default().data(event.to_data())));
    Ok(Sse::new(events.boxed()))
}

/// Tarot reading
async fn tarot_reading(
    State(state): State<AppState>,
    payload: Result<Json<TarotReadingRequest>, JsonRejection>,
) -> Result<EventStream, ApiError> {
    let Json(request) = payload?;
    request.validate()?;
    stream_reading(&state, Prompt::for_tarot(&request)).await
}

/// I Ching reading
async fn iching_divination(
    State(state): State<AppState>,
    payload: Result<Json<IChingReadingRequest>, JsonRejection>,
) -> Result<EventStream, ApiError> {
    let Json(request) = payload?;
    request.validate()?;
    stream_reading(&state, Prompt::for_iching(&request)).await
}

/// Current stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsSnapshot>, ApiError> {
    Ok(Json(state.analytics.snapshot().await?))
}

/// Count a page view for the calling client
async fn increment_page_view(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<PageViewRequest>, JsonRejection>,
) -> Result<Json<PageViewResponse>, ApiError> {
    let Json(request) = payload?;
    let client = client_id(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let counted = state.analytics.record_visit(&client, &request.page).await;
    Ok(Json(PageViewResponse { success: true, counted }))
}

/// First forwarded address, else the peer address
fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn CounterStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    Analytics::new(store.clone()).initialize().await;
    let router = create_router(provider, store);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("divination API running on {}", addr);
    info!("  POST /api/tarot/reading      - Tarot reading (SSE)");
    info!("  POST /api/iching/divination  - I Ching reading (SSE)");
    info!("  GET  /api/stats              - Stats");
    info!("  POST /api/stats/increment    - Count a page view");
    info!("  GET  /health                 - Health check");
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_id_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.4, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_id(&headers, Some(peer)), "198.51.100.4");
    }

    #[test]
    fn test_client_id_falls_back() {
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_id(&HeaderMap::new(), Some(peer)), "127.0.0.1");
        assert_eq!(client_id(&HeaderMap::new(), None), "unknown");
    }
}

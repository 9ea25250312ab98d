//! Application router: every HTTP surface plus shared layers.

use std::time::Duration;

use axum::extract::Json;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::agents::{agents_router, AgentsAppState};
use super::batch::{batch_router, BatchAppState};
use super::webhooks::{webhooks_router, WebhooksAppState};

/// State for each router.
#[derive(Clone)]
pub struct HttpState {
    pub agents: AgentsAppState,
    pub batch: BatchAppState,
    pub webhooks: WebhooksAppState,
}

/// Layer settings taken from server configuration.
#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Upper bound on handling one request.
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health - Liveness
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}

/// Builds the full application router.
pub fn app_router(state: HttpState, settings: &HttpSettings) -> Router {
    let api = Router::new()
        .merge(agents_router().with_state(state.agents))
        .merge(batch_router().with_state(state.batch))
        .merge(webhooks_router().with_state(state.webhooks));

    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http());

    if let Some(timeout) = settings.request_timeout {
        router = router.layer(TimeoutLayer::new(timeout));
    }
    router
}

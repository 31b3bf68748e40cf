//! HTTP service exposing recent frames and process metrics.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::metrics::CollectorMetrics;
use crate::ring::FrameRing;

#[derive(Clone)]
pub struct WebState {
    pub ring: Arc<FrameRing>,
    pub metrics: Arc<CollectorMetrics>,
}

/// Last decoded frames, oldest first, as a JSON array.
async fn get_frames(State(state): State<WebState>) -> impl IntoResponse {
    Json(state.ring.snapshot())
}

/// Counters in the Prometheus text exposition format.
async fn get_metrics(State(state): State<WebState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render_prometheus(),
    )
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/frames", get(get_frames))
        .route("/metrics", get(get_metrics))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Serve the frame/metrics endpoints until the process exits.
pub async fn start_web_server(
    listen_addr: SocketAddr,
    state: WebState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    log::info!(
        "HTTP service listening on http://{}, handling /frames and /metrics",
        listen_addr
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use teleinfo_protocol::{Frame, Mode};

    fn test_state() -> WebState {
        WebState {
            ring: Arc::new(FrameRing::new(4)),
            metrics: CollectorMetrics::new(),
        }
    }

    #[test]
    fn test_frames_snapshot_serializes_flat_fields() {
        let state = test_state();
        let fields: HashMap<String, String> =
            [("PAPP".to_string(), "00340".to_string())].into_iter().collect();
        state.ring.push(Frame::new(Mode::Historic, fields));

        let doc = serde_json::to_value(state.ring.snapshot()).unwrap();
        assert_eq!(doc[0]["PAPP"], "00340");
        assert_eq!(doc[0]["mode"], "historic");
    }

    #[test]
    fn test_router_builds() {
        let _ = router(test_state());
    }
}

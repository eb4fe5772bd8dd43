//! Health router and server entry point.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use depgate_core::{CompatibilityReport, FailurePolicy};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::HttpError;
use crate::state::HealthState;

/// Build the health router.
///
/// - `GET /health`: liveness, always `200 OK`
/// - `GET /health/dependencies`: fresh verification under the log policy;
///   `200` for pass or degraded, `503` for fail, body is the report
pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/health/dependencies", get(dependencies))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> &'static str {
    "OK"
}

async fn dependencies(State(state): State<HealthState>) -> Result<Response, HttpError> {
    let report = run_check(&state).await?;
    let status = if report.overall().is_passing() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(report)).into_response())
}

async fn run_check(state: &HealthState) -> Result<CompatibilityReport, HttpError> {
    let check = state.orchestrator().verify_with_cancel(
        state.descriptors(),
        FailurePolicy::Log,
        state.shutdown(),
    );

    let Some(deadline) = state.deadline() else {
        return Ok(check.await?);
    };

    match tokio::time::timeout(deadline, check).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(HttpError::ServiceUnavailable(format!(
            "dependency check exceeded {}ms",
            deadline.as_millis()
        ))),
    }
}

/// Bind `addr` and serve the health routes until the state's shutdown token
/// fires.
pub async fn serve(addr: SocketAddr, state: HealthState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "Health endpoint listening");

    let shutdown = state.shutdown().clone();
    axum::serve(listener, health_routes(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

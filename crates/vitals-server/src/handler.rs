//! Health check routes.
//!
//! Both endpoints hand the request to [`HealthCheck::evaluate`] and send back
//! whatever the configured renderer produced.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use derive_more::{Deref, From};
use vitals_core::{HealthCheck, HealthResponse};

use crate::TRACING_TARGET_HANDLER;

/// Rendered health check result as an HTTP response.
///
/// Status, headers and body are forwarded unchanged. A status code outside
/// the valid range is replaced with `500 Internal Server Error`, and header
/// names or values that are not valid HTTP are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deref, From)]
pub struct HealthReply(pub HealthResponse);

impl IntoResponse for HealthReply {
    fn into_response(self) -> Response {
        let HealthResponse {
            body,
            status,
            headers,
        } = self.0;

        let status_code = StatusCode::from_u16(status).unwrap_or_else(|_| {
            tracing::warn!(
                target: TRACING_TARGET_HANDLER,
                status,
                "invalid status code, responding with 500"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        });

        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in &headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(header_name), Ok(header_value)) => {
                    header_map.insert(header_name, header_value);
                }
                _ => {
                    tracing::warn!(
                        target: TRACING_TARGET_HANDLER,
                        header = %name,
                        "skipping invalid response header"
                    );
                }
            }
        }

        (status_code, header_map, body).into_response()
    }
}

/// Evaluates every registered check.
async fn health_status(State(health): State<HealthCheck>) -> HealthReply {
    tracing::debug!(target: TRACING_TARGET_HANDLER, "health status requested");
    health.evaluate(None).await.into()
}

/// Evaluates the single check named in the path.
async fn check_status(
    State(health): State<HealthCheck>,
    Path(check): Path<String>,
) -> HealthReply {
    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        check = %check,
        "check status requested"
    );
    health.evaluate(Some(&check)).await.into()
}

/// Returns a [`Router`] serving `GET /health` and `GET /health/{check}`.
pub fn routes(health: HealthCheck) -> Router {
    Router::new()
        .route("/health", get(health_status))
        .route("/health/{check}", get(check_status))
        .with_state(health)
}

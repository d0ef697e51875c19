//! HTTP surface: common routes, the resource fallback, and the layers around them.

mod common;
mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::error::{status, AppError};
use crate::message;
use crate::response::{panic_response, ApiResponse};
use crate::state::AppState;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// The full application: health/version, resources, body limit, tracing, panic catching.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes())
        .merge(resource_routes(state))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::map_response(envelope_oversized_body))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TraceLayer::new_for_http()),
        )
}

/// A declared `Content-Length` over the limit is refused before any handler runs, with a
/// plain-text body. Re-render it as an envelope.
async fn envelope_oversized_body(response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE || is_json(&response) {
        return response;
    }
    let err = AppError::request_with_status(status::PAYLOAD_TOO_LARGE, message::BODY_TOO_LARGE);
    ApiResponse::from_error(&err, false).into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

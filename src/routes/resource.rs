//! Resource routes: a fallback that hands every unclaimed path to the dispatcher.

use crate::handlers::dispatch::dispatch;
use crate::state::AppState;
use axum::Router;

pub fn resource_routes(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

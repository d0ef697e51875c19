//! Shared application state for all routes. Built once at startup, read-only afterwards.

use crate::handlers::Dispatcher;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        AppState {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

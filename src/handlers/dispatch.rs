//! Request dispatch: (verb, path, body) -> resource operation -> response envelope.

use crate::error::{status, AppError};
use crate::handlers::controller::Operation;
use crate::message;
use crate::registry::Registry;
use crate::resource::Record;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::store::Storage;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{Method, StatusCode, Uri},
};
use serde_json::Value;
use std::sync::Arc;

/// Verb used when the request carries none (e.g. driven from a script).
pub const DEFAULT_VERB: &str = "cli";

/// Verbs whose body is decoded into the request record.
pub const WITH_DATA_VERBS: &[&str] = &["post", "put", "patch"];

/// Transport-independent inbound request.
#[derive(Clone, Debug, Default)]
pub struct ApiRequest {
    pub verb: Option<String>,
    pub path: String,
    pub body: Option<Bytes>,
}

impl ApiRequest {
    pub fn new(verb: &str, path: &str) -> Self {
        ApiRequest {
            verb: Some(verb.to_string()),
            path: path.to_string(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    storage: Arc<dyn Storage>,
    development: bool,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, storage: Arc<dyn Storage>, development: bool) -> Self {
        Dispatcher {
            registry,
            storage,
            development,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn development(&self) -> bool {
        self.development
    }

    /// Handle one request to completion. Never fails: every error becomes an envelope.
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        let verb = normalize_verb(request.verb.as_deref());
        let path = request.path.trim_matches('/');
        let response = match self.route(&verb, path, request.body.as_ref()).await {
            Ok((status, data)) => ApiResponse::success(status, data),
            Err(e) => {
                if e.is_server() {
                    tracing::error!(verb = %verb, path = %path, error = %e.detailed_message(), "server error");
                } else {
                    tracing::warn!(verb = %verb, path = %path, error = %e, "request rejected");
                }
                ApiResponse::from_error(&e, self.development)
            }
        };
        tracing::info!(verb = %verb, path = %path, status = response.status.as_u16(), "dispatched");
        response
    }

    async fn route(
        &self,
        verb: &str,
        path: &str,
        body: Option<&Bytes>,
    ) -> Result<(u16, Vec<Record>), AppError> {
        let mut request = decode_body(verb, body)?;

        let route = self
            .registry
            .resolve(path)
            .ok_or_else(|| AppError::not_found(message::NOT_FOUND_ROUTE))?;
        let controller = route.controller;
        let resource = controller.resource();

        let operation = Operation::for_verb(verb)
            .ok_or_else(|| AppError::server(message::no_such_method(verb, resource.name())))?;

        if let Some(raw) = route.captured.as_deref() {
            let id = resource.id_kind().parse(raw, resource.name())?;
            request.insert(resource.id_field().to_string(), id);
        }

        let storage = self.storage.as_ref();
        let data = match operation {
            Operation::Get => controller.get(storage, request).await?,
            Operation::Add => controller.add(storage, request).await?,
            Operation::Edit => controller.edit(storage, request).await?,
            Operation::Delete => controller.delete(storage, request).await?,
        };
        Ok((operation.success_status(), data))
    }
}

pub fn normalize_verb(verb: Option<&str>) -> String {
    verb.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_VERB.to_string())
}

/// Body of a write verb as a record; an empty body is an empty record.
fn decode_body(verb: &str, body: Option<&Bytes>) -> Result<Record, AppError> {
    if !WITH_DATA_VERBS.contains(&verb) {
        return Ok(Record::new());
    }
    let Some(bytes) = body.filter(|b| !b.iter().all(u8::is_ascii_whitespace)) else {
        return Ok(Record::new());
    };
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::request(message::BODY_NOT_OBJECT)),
        Err(e) => Err(AppError::request(format!("{}: {}", message::BODY_NOT_OBJECT, e))),
    }
}

/// Body that could not be buffered: over the size limit (413) or unreadable.
fn body_rejection(rejection: &BytesRejection) -> AppError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::request_with_status(status::PAYLOAD_TOO_LARGE, message::BODY_TOO_LARGE)
        }
        other => AppError::request_with_status(other.as_u16(), rejection.body_text()),
    }
}

/// Axum entry point: every path not claimed by another route lands here.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = body_rejection(&rejection);
            tracing::warn!(method = %method, path = %uri.path(), error = %rejection, "body rejected");
            return ApiResponse::from_error(&err, state.dispatcher.development());
        }
    };
    let request = ApiRequest {
        verb: Some(method.as_str().to_string()),
        path: uri.path().to_string(),
        body: Some(body),
    };
    state.dispatcher.dispatch(request).await
}

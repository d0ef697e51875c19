//! Standard response envelope: `{"data": [...]}` or `{"error": "..."}`, status out-of-band.

use crate::error::AppError;
use crate::message;
use crate::resource::Record;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Envelope {
    Data { data: Vec<Record> },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Envelope,
}

impl ApiResponse {
    pub fn success(status: u16, data: Vec<Record>) -> Self {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
            body: Envelope::Data { data },
        }
    }

    /// Render an error; server errors only show their detail in development mode.
    pub fn from_error(err: &AppError, development: bool) -> Self {
        ApiResponse {
            status: err.status(),
            body: Envelope::Error {
                error: err.public_message(development),
            },
        }
    }

    pub fn data(&self) -> Option<&[Record]> {
        match &self.body {
            Envelope::Data { data } => Some(data),
            Envelope::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.body {
            Envelope::Error { error } => Some(error),
            Envelope::Data { .. } => None,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Last-resort rendering for a panic inside a handler.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");
    ApiResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: Envelope::Error {
            error: message::SERVER_ERROR.to_string(),
        },
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_to_one_key() {
        let ok = ApiResponse::success(200, vec![json!({"id": 1}).as_object().cloned().unwrap()]);
        assert_eq!(serde_json::to_value(&ok.body).unwrap(), json!({"data": [{"id": 1}]}));

        let err = ApiResponse::from_error(&AppError::not_found("No such route"), false);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::to_value(&err.body).unwrap(),
            json!({"error": "No such route"})
        );
    }

    #[test]
    fn server_errors_are_generic_outside_development() {
        let err = AppError::server("column typo in resource");
        let shown = ApiResponse::from_error(&err, false);
        assert_eq!(shown.error(), Some(message::SERVER_ERROR));
        let dev = ApiResponse::from_error(&err, true);
        assert_eq!(dev.error(), Some("column typo in resource"));
    }
}

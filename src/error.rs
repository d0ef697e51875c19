//! Typed errors and HTTP status mapping.

use crate::message;
use axum::http::StatusCode;
use std::error::Error as StdError;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Status codes the API answers with. The 58x range is reserved for storage and whitelist failures.
pub mod status {
    pub const SUCCESS: u16 = 200;
    pub const SUCCESSFULLY_ADDED: u16 = 201;

    pub const REQUEST_ERROR: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const PAYLOAD_TOO_LARGE: u16 = 413;
    pub const VALIDATION_ERROR: u16 = 422;

    pub const SERVER_ERROR: u16 = 500;
    pub const STORAGE_ERROR: u16 = 580;
    pub const BAD_FILTER: u16 = 581;
    pub const BAD_COLUMN: u16 = 582;
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidSetting { key: &'static str, value: String },
    #[error("duplicate route name: {0}")]
    DuplicateRoute(String),
    #[error("invalid resource declaration: {0}")]
    InvalidResource(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    /// The request refers to something absent or is malformed in a way the caller can fix.
    #[error("{message}")]
    Request { message: String, status: u16 },
    /// One or more validation rules failed; the message lists every failure.
    #[error("{message}")]
    Validation { message: String },
    /// Anything the caller cannot fix. The message is developer-facing.
    #[error("{message}")]
    Server {
        message: String,
        status: u16,
        #[source]
        source: Option<BoxError>,
    },
}

impl AppError {
    pub fn request(message: impl Into<String>) -> Self {
        AppError::Request {
            message: message.into(),
            status: status::REQUEST_ERROR,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::Request {
            message: message.into(),
            status: status::NOT_FOUND,
        }
    }

    /// Request error with a status other than 400/404, e.g. 413 for an oversized body.
    pub fn request_with_status(status: u16, message: impl Into<String>) -> Self {
        AppError::Request {
            message: message.into(),
            status,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        AppError::Server {
            message: message.into(),
            status: status::SERVER_ERROR,
            source: None,
        }
    }

    pub fn server_with_status(status: u16, message: impl Into<String>) -> Self {
        AppError::Server {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Wrap an unexpected failure, keeping it as the error source.
    pub fn internal<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        AppError::Server {
            message: message.into(),
            status: status::SERVER_ERROR,
            source: Some(Box::new(source)),
        }
    }

    pub fn status(&self) -> StatusCode {
        let code = match self {
            AppError::Request { status, .. } => *status,
            AppError::Validation { .. } => status::VALIDATION_ERROR,
            AppError::Server { status, .. } => *status,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is_server(&self) -> bool {
        matches!(self, AppError::Server { .. })
    }

    /// Message shown to the client. Server errors only reveal their detail in development mode.
    pub fn public_message(&self, development: bool) -> String {
        match self {
            AppError::Server { .. } if development => self.detailed_message(),
            AppError::Server { .. } => message::SERVER_ERROR.to_string(),
            other => other.to_string(),
        }
    }

    /// The message followed by its whole source chain.
    pub fn detailed_message(&self) -> String {
        let mut out = self.to_string();
        let mut cause = self.source();
        while let Some(e) = cause {
            out.push_str("\ncaused by: ");
            out.push_str(&e.to_string());
            cause = e.source();
        }
        out
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Server {
            message: format!("{}: {}", message::STORAGE_ERROR, e),
            status: status::STORAGE_ERROR,
            source: Some(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(AppError::request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::validation("x").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::server("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::request_with_status(status::PAYLOAD_TOO_LARGE, "x").status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::server_with_status(status::BAD_COLUMN, "x")
                .status()
                .as_u16(),
            582
        );
    }

    #[test]
    fn server_detail_is_hidden_outside_development() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = AppError::internal("could not write", source);

        assert_eq!(err.public_message(false), message::SERVER_ERROR);

        let detailed = err.public_message(true);
        assert!(detailed.starts_with("could not write"));
        assert!(detailed.contains("caused by: disk on fire"));
    }

    #[test]
    fn client_errors_are_always_shown() {
        let err = AppError::not_found(message::NOT_FOUND_ROUTE);
        assert_eq!(err.public_message(false), "No such route");
        assert!(!err.is_server());
    }

    #[test]
    fn storage_failures_map_to_storage_status() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status().as_u16(), status::STORAGE_ERROR);
        assert!(err.is_server());
        assert!(std::error::Error::source(&err).is_some());
    }
}

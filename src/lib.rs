//! Resource API: whitelisted resources exposed as a REST API over parameterized SQL.

pub mod case;
pub mod config;
pub mod datetime;
pub mod error;
pub mod handlers;
pub mod message;
pub mod registry;
pub mod resource;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{init_tracing, Settings};
pub use error::{AppError, ConfigError};
pub use handlers::{ApiRequest, Controller, DefaultController, Dispatcher};
pub use registry::Registry;
pub use resource::{IdKind, Record, Resource};
pub use response::{ApiResponse, Envelope};
pub use routes::{app, common_routes, resource_routes};
pub use service::{CrudService, Validation};
pub use state::AppState;
pub use store::{SqlStorage, Storage};

//! Controllers and the dispatch entry point.

pub mod controller;
pub mod dispatch;
pub use controller::*;
pub use dispatch::{ApiRequest, Dispatcher};

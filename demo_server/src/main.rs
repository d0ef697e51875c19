//! Demo server: widgets and construction stages over SQLite (or any `DATABASE_URL`).
//!
//! Run from repo root: `cargo run -p demo-server`

mod construction_stages;
mod widgets;

use construction_stages::ConstructionStagesController;
use resource_api::{app, init_tracing, AppState, Dispatcher, Registry, Settings, SqlStorage};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing("resource_api=info,demo_server=info");

    let storage = SqlStorage::connect(&settings.database_url, settings.db_max_connections).await?;
    storage.execute_script(include_str!("../schema.sql")).await?;

    let mut registry = Registry::new();
    registry
        .register_resource(widgets::resource()?)?
        .register(ConstructionStagesController::new()?)?;
    let routes: Vec<_> = registry.route_names().map(str::to_string).collect();

    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(storage), settings.development);
    let app = app(AppState::new(dispatcher), settings.max_body_bytes);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        development = settings.development,
        routes = ?routes,
        "demo server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

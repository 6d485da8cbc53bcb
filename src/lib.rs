//! runwatch -- in-memory demo API with an asynchronous test execution tracker.
//!
//! The crate exposes a small user CRUD store and a test runner whose
//! executions are started in the background and polled by id.

pub mod api;
pub mod config;
pub mod tracker;
pub mod users;

use anyhow::Result;
use tower_http::cors::CorsLayer;

use crate::config::Config;

/// Start the runwatch daemon: seed the user store, build the tracker and
/// serve the HTTP API until the listener fails.
pub async fn serve(config: &Config) -> Result<()> {
    let state = api::state::AppState {
        users: users::UserStore::seeded().await,
        tests: tracker::TestRunnerService::from_config(&config.runner),
    };

    let mut app = api::router(state);
    if config.server.cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr: std::net::SocketAddr = config.server.bind.parse()?;
    tracing::info!(%addr, time_scale = config.runner.time_scale, "runwatch listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

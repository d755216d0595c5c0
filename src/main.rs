//! Promille - An in-memory blood alcohol concentration tracking service.
//!
//! # API Endpoints
//!
//! - `POST /person` - Create a person
//! - `GET /person/{id}` - Fetch a person
//! - `PUT /person/{id}` - Update weight and gender flag
//! - `POST /person/{id}/drink` - Record a drink
//! - `DELETE /person/{id}/drink/{drink_id}` - Remove a drink
//! - `GET /health` - Health check

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use promille::api::{AppState, router};
use promille::storage::PersonRepository;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("promille=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("PROMILLE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    info!(port, "Starting Promille server");

    // The repository lives for the process lifetime; every handler shares it
    let state = AppState {
        repository: PersonRepository::new(),
    };

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Promille is listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// main.rs
// Axum server wiring: initializes MongoDB-backed state, builds the
// router, and serves on :8080.
//
// Endpoints:
// - POST /login                          -> bearer token for staff/executives
// - /transactions (+ /statistics, /bulk, /{id}, /{id}/verify-otp)
// - /doctors, /executives, /locations, /staff  -> role-gated CRUD
// - /platform-settings                   -> singleton enable/disable gate

use std::{net::SocketAddr, sync::Arc};

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use docreach::{app::build_router, state};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let state = Arc::new(
        state::init_state()
            .await
            .expect("failed to initialize MongoDB state"),
    );

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.expect("failed to bind :8080");
    axum::serve(listener, app).await.expect("server error");
}

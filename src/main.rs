// SPDX-License-Identifier: MIT

//! Flashlog API server.
//!
//! Sailing club logbook: members log flash days, the leaderboard ranks
//! qualifying days, and admins run award fulfillment from the dashboard.

use flashlog::{
    config::Config,
    db::FirestoreDb,
    services::{AwardService, ExportService, Mailer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Flashlog API");

    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let mailer = Mailer::new(&config);
    let awards = AwardService::new(db.clone());
    let exports = ExportService::new(db.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        mailer,
        awards,
        exports,
        resend_limiter: dashmap::DashMap::new(),
    });

    let app = flashlog::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flashlog=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

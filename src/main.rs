// SPDX-License-Identifier: MIT

//! MUSE Usage & Entitlements API Server
//!
//! Reconciles usage counters against subscription-tier quotas and tracks
//! guest sessions until they convert into accounts.

use muse_usage::{
    config::Config,
    db::{FirestoreDb, LocalStore},
    services::{BillingClient, GuestSessionStore, ProfileService, UsageService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting MUSE usage API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Open the local key-value store for guest-scoped data
    let local = Arc::new(LocalStore::open(&config.local_store_path));
    tracing::info!(path = %config.local_store_path.display(), "Local store opened");

    // Initialize the billing client
    let billing = BillingClient::new(
        config.billing_api_url.clone(),
        config.billing_api_key.clone(),
    );
    tracing::info!(url = %config.billing_api_url, "Billing client initialized");

    let guest_sessions = GuestSessionStore::new(local.clone());
    let usage_service = UsageService::new(db.clone(), local);
    let profile_service = ProfileService::new(db.clone(), billing, config.plan_map.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        guest_sessions,
        usage_service,
        profile_service,
    });

    // Build router
    let app = muse_usage::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("muse_usage=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

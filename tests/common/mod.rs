// SPDX-License-Identifier: MIT

use muse_usage::config::Config;
use muse_usage::db::{FirestoreDb, LocalStore};
use muse_usage::routes::create_router;
use muse_usage::services::{BillingClient, GuestSessionStore, ProfileService, UsageService};
use muse_usage::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db_offline();
    let local = Arc::new(LocalStore::in_memory());
    let billing = BillingClient::new_mock();

    let guest_sessions = GuestSessionStore::new(local.clone());
    let usage_service = UsageService::new(db.clone(), local);
    let profile_service = ProfileService::new(db.clone(), billing, config.plan_map.clone());

    let state = Arc::new(AppState {
        config,
        db,
        guest_sessions,
        usage_service,
        profile_service,
    });

    (create_router(state.clone()), state)
}

/// Create a signed session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    muse_usage::middleware::auth::create_jwt(user_id, signing_key).expect("JWT creation")
}

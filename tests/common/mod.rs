// SPDX-License-Identifier: MIT

use flashlog::config::Config;
use flashlog::db::FirestoreDb;
use flashlog::routes::create_router;
use flashlog::services::{AwardService, ExportService, Mailer};
use flashlog::AppState;
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
    let config = Config::test_default();
    let db = test_db_offline();
    let mailer = Mailer::new_mock();
    let awards = AwardService::new(db.clone());
    let exports = ExportService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        mailer,
        awards,
        exports,
        resend_limiter: dashmap::DashMap::new(),
    });

    (create_router(state.clone()), state)
}

/// Create a session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, is_admin: bool, signing_key: &[u8]) -> String {
    flashlog::middleware::auth::create_jwt(user_id, is_admin, signing_key)
        .expect("JWT creation should succeed")
}

// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FLASHES: &str = "flashes";
    pub const MEMBERSHIPS: &str = "memberships";
    pub const AWARD_FULFILLMENTS: &str = "award_fulfillments";
    pub const AUDIT_LOGS: &str = "audit_logs";
}

// SPDX-License-Identifier: MIT

//! Member model for storage and API.

use serde::{Deserialize, Serialize};

/// Member profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Member ID (also used as document ID)
    pub user_id: u64,
    /// Email address (login identity)
    pub email: String,
    /// Whether the email address has been verified
    pub email_verified: bool,
    /// PBKDF2 password hash (base64)
    pub password_hash: String,
    /// PBKDF2 salt (base64)
    pub password_salt: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Street address
    pub street: String,
    /// City
    pub city: String,
    /// State / province
    pub state: String,
    /// Postal code
    pub zip: String,
    /// Whether this member may use the admin dashboard
    pub is_admin: bool,
    /// When the member registered (RFC 3339)
    pub created_at: String,
}

impl User {
    /// Display name used in award rows, audit entries, and exports.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

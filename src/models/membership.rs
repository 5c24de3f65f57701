// SPDX-License-Identifier: MIT

//! Yearly membership record: district/fleet affiliation "as of year Y".

use serde::{Deserialize, Serialize};

/// Membership record stored in Firestore, one per (member, year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Owning member ID
    pub user_id: u64,
    /// Membership year
    pub year: i32,
    /// District affiliation for the year
    pub district: String,
    /// Fleet affiliation for the year
    pub fleet: String,
}

impl Membership {
    /// Firestore document ID: one document per (member, year).
    pub fn doc_id(user_id: u64, year: i32) -> String {
        format!("{}_{}", user_id, year)
    }
}

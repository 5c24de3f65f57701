// SPDX-License-Identifier: MIT

//! Audit log entries for admin award actions.

use serde::{Deserialize, Serialize};

/// One audit entry per bulk award action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Admin who performed the action
    pub actor_id: u64,
    /// Admin display name at the time of the action
    pub actor_name: String,
    /// Action type, e.g. "award_bulk_transition"
    pub action: String,
    /// Award year the action applied to
    pub year: i32,
    /// One human-readable transition description per changed pair,
    /// e.g. "user 42 tier 10: earned → processing"
    pub changes: Vec<String>,
    /// Number of pairs actually changed
    pub updated: u32,
    /// Number of pairs left untouched (already in the target state, or
    /// skipped because the member did not qualify)
    pub unchanged: u32,
    /// When the action ran (RFC 3339)
    pub created_at: String,
}

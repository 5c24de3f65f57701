// SPDX-License-Identifier: MIT

//! Flashlog: a sailing club "flash" logbook backend.
//!
//! Members log one activity day at a time, a leaderboard ranks members by
//! qualifying days, and an admin dashboard tracks 10/25/50-day award tiers
//! through the earned → processing → sent fulfillment lifecycle.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod season;
pub mod services;

use chrono::{DateTime, Utc};
use config::Config;
use db::FirestoreDb;
use services::{AwardService, ExportService, Mailer};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub mailer: Mailer,
    pub awards: AwardService,
    pub exports: ExportService,
    /// Last verification-email send per address, for resend rate limiting.
    pub resend_limiter: dashmap::DashMap<String, DateTime<Utc>>,
}

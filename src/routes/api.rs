// SPDX-License-Identifier: MIT

//! API routes for authenticated members.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::flash::qualifying_days;
use crate::models::{ActivityKind, Flash, Membership, SailingEvent};
use crate::season;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/flashes", get(list_flashes).put(upsert_flash))
        .route("/api/flashes/{date}", delete(delete_flash))
        .route("/api/leaderboard", get(leaderboard))
}

// ─── Member Profile ──────────────────────────────────────────

/// Current member response.
#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: u64,
    pub email: String,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

/// Get current member profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;

    Ok(Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
        email_verified: user.email_verified,
        first_name: user.first_name,
        last_name: user.last_name,
        is_admin: user.is_admin,
    }))
}

// ─── Flashes ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct YearQuery {
    /// Defaults to the current year
    year: Option<i32>,
}

impl YearQuery {
    fn resolve(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }
}

#[derive(Serialize)]
pub struct FlashResponse {
    pub date: NaiveDate,
    pub kind: ActivityKind,
    pub sailing_event: Option<SailingEvent>,
    pub editable: bool,
}

#[derive(Serialize)]
pub struct FlashListResponse {
    pub year: i32,
    pub flashes: Vec<FlashResponse>,
    /// Capped qualifying-day total for the year
    pub total_days: u32,
}

/// List the member's flashes for a year, with the capped total.
async fn list_flashes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<YearQuery>,
) -> Result<Json<FlashListResponse>> {
    let year = query.resolve();
    let flashes = state
        .db
        .get_flashes_for_user_year(auth.user_id, year)
        .await?;
    let total_days = qualifying_days(&flashes);
    let today = Utc::now().date_naive();

    Ok(Json(FlashListResponse {
        year,
        flashes: flashes
            .into_iter()
            .map(|f| FlashResponse {
                date: f.date,
                kind: f.kind,
                sailing_event: f.sailing_event,
                editable: season::is_editable(f.date, today),
            })
            .collect(),
        total_days,
    }))
}

#[derive(Deserialize)]
pub struct UpsertFlashRequest {
    pub date: NaiveDate,
    pub kind: ActivityKind,
    pub sailing_event: Option<SailingEvent>,
}

/// Create or replace the member's flash for a date.
///
/// One flash per member per day: writing an existing date replaces the
/// earlier entry. The date must be inside the edit window.
async fn upsert_flash(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpsertFlashRequest>,
) -> Result<Json<FlashResponse>> {
    let today = Utc::now().date_naive();
    if !season::is_editable(req.date, today) {
        return Err(AppError::BadRequest(
            "Date is outside the edit window".to_string(),
        ));
    }
    if req.sailing_event.is_some() && req.kind != ActivityKind::Sailing {
        return Err(AppError::BadRequest(
            "Sailing event subtype requires a sailing day".to_string(),
        ));
    }

    let flash = Flash {
        user_id: auth.user_id,
        date: req.date,
        year: req.date.year(),
        kind: req.kind,
        sailing_event: req.sailing_event,
        logged_at: Utc::now().to_rfc3339(),
    };
    state.db.upsert_flash(&flash).await?;

    tracing::info!(user_id = auth.user_id, date = %req.date, "Flash logged");

    Ok(Json(FlashResponse {
        date: flash.date,
        kind: flash.kind,
        sailing_event: flash.sailing_event,
        editable: true,
    }))
}

/// Delete the member's flash for a date (edit window enforced).
async fn delete_flash(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<serde_json::Value>> {
    let today = Utc::now().date_naive();
    if !season::is_editable(date, today) {
        return Err(AppError::BadRequest(
            "Date is outside the edit window".to_string(),
        ));
    }

    if state.db.get_flash(auth.user_id, date).await?.is_none() {
        return Err(AppError::NotFound(format!("No flash on {}", date)));
    }
    state.db.delete_flash(auth.user_id, date).await?;

    tracing::info!(user_id = auth.user_id, date = %date, "Flash deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub user_id: u64,
    pub name: String,
    pub fleet: String,
    pub district: String,
    pub total_days: u32,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub year: i32,
    pub rows: Vec<LeaderboardRow>,
}

/// Rank members by capped qualifying days for the year. Ties share a
/// rank; members with no flashes are omitted.
async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let year = query.resolve();

    let users = state.db.list_users().await?;
    let flashes = state.db.get_flashes_for_year(year).await?;
    let memberships = state.db.get_memberships_for_year(year).await?;

    let mut flashes_by_user: HashMap<u64, Vec<Flash>> = HashMap::new();
    for flash in flashes {
        flashes_by_user.entry(flash.user_id).or_default().push(flash);
    }
    let memberships_by_user: HashMap<u64, Membership> = memberships
        .into_iter()
        .map(|m| (m.user_id, m))
        .collect();

    let mut totals: Vec<(u64, String, u32)> = users
        .iter()
        .filter_map(|user| {
            let total = qualifying_days(flashes_by_user.get(&user.user_id)?);
            (total > 0).then(|| (user.user_id, user.display_name(), total))
        })
        .collect();

    totals.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(&b.1)));

    let mut rows = Vec::with_capacity(totals.len());
    let mut rank = 0u32;
    let mut last_total = None;
    for (i, (user_id, name, total)) in totals.into_iter().enumerate() {
        if last_total != Some(total) {
            rank = i as u32 + 1;
            last_total = Some(total);
        }
        let (fleet, district) = memberships_by_user
            .get(&user_id)
            .map(|m| (m.fleet.clone(), m.district.clone()))
            .unwrap_or_default();
        rows.push(LeaderboardRow {
            rank,
            user_id,
            name,
            fleet,
            district,
            total_days: total,
        });
    }

    Ok(Json(LeaderboardResponse { year, rows }))
}

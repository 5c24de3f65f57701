// SPDX-License-Identifier: MIT

//! Admin award dashboard routes.
//!
//! All routes here sit behind `require_auth` + `require_admin`; a
//! non-admin session gets a 403 before any data is fetched.

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{AuditEntry, AwardRow, AwardTier};
use crate::services::export::export_filename;
use crate::services::{AwardFilter, BulkOutcome, StatusFilter, TierFilter, TransitionTarget};
use crate::AppState;

const MAX_AUDIT_LIMIT: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/awards", get(list_awards))
        .route("/api/admin/awards/transition", post(bulk_transition))
        .route("/api/admin/awards/export", post(export_csv))
        .route("/api/admin/audit", get(list_audit))
}

// ─── Dashboard rows ──────────────────────────────────────────

#[derive(Deserialize)]
struct AwardsQuery {
    /// Defaults to the current year
    year: Option<i32>,
    /// all | pending | earned | processing | sent
    status: Option<String>,
    /// all | 10 | 25 | 50
    tier: Option<String>,
    /// Case-insensitive substring over name and email
    search: Option<String>,
}

#[derive(Serialize)]
pub struct AwardsResponse {
    pub year: i32,
    pub rows: Vec<AwardRow>,
}

async fn list_awards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AwardsQuery>,
) -> Result<Json<AwardsResponse>> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let filter = AwardFilter {
        status: match &query.status {
            Some(raw) => StatusFilter::parse(raw)?,
            None => StatusFilter::All,
        },
        tier: match &query.tier {
            Some(raw) => TierFilter::parse(raw)?,
            None => TierFilter::All,
        },
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
    };

    let rows = state.awards.aggregate(year).await?;
    Ok(Json(AwardsResponse {
        year,
        rows: filter.apply(rows),
    }))
}

// ─── Bulk transitions ────────────────────────────────────────

// Serialize is required by the validator derive, which embeds the
// offending value in validation error params.
#[derive(Serialize, Deserialize)]
pub struct SelectionItem {
    pub user_id: u64,
    /// Tier threshold: 10, 25, or 50
    pub tier: u32,
}

#[derive(Deserialize, Validate)]
pub struct TransitionRequest {
    /// Defaults to the current year
    pub year: Option<i32>,
    #[validate(length(min = 1, message = "selection must not be empty"))]
    pub selection: Vec<SelectionItem>,
    pub target: TransitionTarget,
    /// Required when the selection includes a sent-award downgrade or a
    /// direct earned → sent transition
    #[serde(default)]
    pub acknowledge: bool,
}

async fn bulk_transition(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<BulkOutcome>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let year = req.year.unwrap_or_else(|| Utc::now().year());
    let selection = parse_selection(&req.selection)?;

    let actor = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let outcome = state
        .awards
        .bulk_transition(
            &state.mailer,
            &actor,
            year,
            &selection,
            req.target,
            req.acknowledge,
        )
        .await?;

    Ok(Json(outcome))
}

/// Parse and validate selection items; malformed tiers reject the whole
/// request before anything runs.
fn parse_selection(items: &[SelectionItem]) -> Result<Vec<(u64, AwardTier)>> {
    items
        .iter()
        .map(|item| {
            let tier = AwardTier::try_from(item.tier).map_err(AppError::BadRequest)?;
            Ok((item.user_id, tier))
        })
        .collect()
}

// ─── CSV export ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ExportRequest {
    /// Defaults to the current year
    pub year: Option<i32>,
    #[validate(length(min = 1, message = "selection must not be empty"))]
    pub selection: Vec<SelectionItem>,
}

async fn export_csv(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<Response> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let year = req.year.unwrap_or_else(|| Utc::now().year());
    let selection = parse_selection(&req.selection)?;
    let filename = export_filename(year, Utc::now());

    tracing::info!(year, pairs = selection.len(), "Streaming award export");

    let stream = state.exports.stream(year, selection);

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Response build failed: {}", e)))?;

    Ok(response)
}

// ─── Audit log ───────────────────────────────────────────────

#[derive(Deserialize)]
struct AuditQuery {
    /// Defaults to the current year
    year: Option<i32>,
    /// Defaults to 50, capped at 200
    limit: Option<u32>,
}

#[derive(Serialize)]
pub struct AuditResponse {
    pub year: i32,
    pub entries: Vec<AuditEntry>,
}

async fn list_audit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditResponse>> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let limit = query.limit.unwrap_or(50).min(MAX_AUDIT_LIMIT);

    let entries = state.db.list_audit_entries(year, limit).await?;
    Ok(Json(AuditResponse { year, entries }))
}

// SPDX-License-Identifier: MIT

//! Streaming CSV export for the award dashboard.
//!
//! The selection is fetched and emitted in bounded batches so the full
//! result set is never held in memory; the HTTP body is an async stream
//! of encoded chunks. The file starts with a UTF-8 byte-order mark so
//! spreadsheet software picks the right encoding; quoting is RFC 4180
//! via the `csv` crate.

use std::collections::HashMap;

use axum::body::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::{stream, Stream, StreamExt};

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::award::resolve_status;
use crate::models::flash::{qualifying_days, threshold_date};
use crate::models::{AwardStatus, AwardTier, Flash};

/// Pairs fetched per emitted chunk.
const EXPORT_BATCH: usize = 50;

/// UTF-8 byte-order mark, for spreadsheet compatibility.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Fixed header row of the export.
pub const CSV_HEADER: [&str; 12] = [
    "Name",
    "Fleet",
    "District",
    "Email",
    "Street",
    "City",
    "State",
    "Zip",
    "Award Tier",
    "Total Days",
    "Date Threshold Reached",
    "Status",
];

/// One encoded row of the export.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub name: String,
    pub fleet: String,
    pub district: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub tier: AwardTier,
    pub total_days: u32,
    pub threshold_date: Option<NaiveDate>,
    pub status: AwardStatus,
}

/// Encode a batch of rows, optionally preceded by the header record.
pub fn encode_batch(rows: &[ExportRow], include_header: bool) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if include_header {
        writer
            .write_record(CSV_HEADER)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV encode failed: {}", e)))?;
    }

    for row in rows {
        writer
            .write_record([
                row.name.as_str(),
                row.fleet.as_str(),
                row.district.as_str(),
                row.email.as_str(),
                row.street.as_str(),
                row.city.as_str(),
                row.state.as_str(),
                row.zip.as_str(),
                &row.tier.to_string(),
                &row.total_days.to_string(),
                &row.threshold_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                &row.status.to_string(),
            ])
            .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV encode failed: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV encode failed: {}", e)))
}

/// Export filename embedding the award year and export timestamp.
pub fn export_filename(year: i32, now: DateTime<Utc>) -> String {
    format!(
        "flash-awards-{}-{}.csv",
        year,
        now.format("%Y%m%dT%H%M%SZ")
    )
}

/// CSV export service.
#[derive(Clone)]
pub struct ExportService {
    db: FirestoreDb,
}

impl ExportService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Build the export rows for one batch of (member, tier) pairs.
    ///
    /// Pairs referencing unknown members, or tiers with neither a
    /// qualifying count nor a record, are skipped with a warning; the
    /// export is a best-effort snapshot of what the dashboard showed.
    pub async fn build_rows(
        &self,
        year: i32,
        pairs: &[(u64, AwardTier)],
    ) -> Result<Vec<ExportRow>> {
        // Cache per-member data within the batch; a member selected at
        // two tiers is fetched once.
        let mut flashes_cache: HashMap<u64, Vec<Flash>> = HashMap::new();
        let mut rows = Vec::with_capacity(pairs.len());

        for (user_id, tier) in pairs {
            let Some(user) = self.db.get_user(*user_id).await? else {
                tracing::warn!(user_id, "Export selection references unknown member");
                continue;
            };

            if !flashes_cache.contains_key(user_id) {
                let flashes = self.db.get_flashes_for_user_year(*user_id, year).await?;
                flashes_cache.insert(*user_id, flashes);
            }
            let flashes = &flashes_cache[user_id];
            let total_days = qualifying_days(flashes);

            let record = self.db.get_fulfillment(*user_id, year, *tier).await?;
            let Some((status, _)) = resolve_status(total_days, *tier, record.as_ref()) else {
                tracing::warn!(
                    user_id,
                    tier = tier.threshold(),
                    "Export selection references a tier with no row"
                );
                continue;
            };

            let membership = self.db.get_membership(*user_id, year).await?;
            let (fleet, district) = membership
                .map(|m| (m.fleet, m.district))
                .unwrap_or_default();

            rows.push(ExportRow {
                name: user.display_name(),
                fleet,
                district,
                email: user.email,
                street: user.street,
                city: user.city,
                state: user.state,
                zip: user.zip,
                tier: *tier,
                total_days,
                threshold_date: threshold_date(flashes, tier.threshold()),
                status,
            });
        }

        Ok(rows)
    }

    /// Stream the export as CSV chunks: BOM + header first, then one
    /// chunk per batch of pairs.
    pub fn stream(
        &self,
        year: i32,
        pairs: Vec<(u64, AwardTier)>,
    ) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        let db = self.db.clone();
        let chunks: Vec<Vec<(u64, AwardTier)>> =
            pairs.chunks(EXPORT_BATCH).map(|c| c.to_vec()).collect();

        let header = stream::once(async {
            let mut bytes = UTF8_BOM.to_vec();
            bytes.extend(encode_batch(&[], true)?);
            Ok(Bytes::from(bytes))
        });

        let body = stream::iter(chunks).then(move |chunk| {
            let service = ExportService { db: db.clone() };
            async move {
                let rows = service.build_rows(year, &chunk).await?;
                Ok(Bytes::from(encode_batch(&rows, false)?))
            }
        });

        header.chain(body)
    }
}

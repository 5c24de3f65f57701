// SPDX-License-Identifier: MIT

//! Award dashboard logic: aggregation, filtering, and bulk status
//! transitions.
//!
//! The transition state machine is kept as a pure planning step
//! ([`plan_transition`]) over per-pair inputs, separate from the
//! database writes that apply the plan. The rules:
//!
//! - no record + target processing/sent: create only if the member
//!   currently qualifies, otherwise silently skip;
//! - existing record: update in either direction regardless of current
//!   qualification (the award was legitimately processed earlier);
//! - downgrading sent → processing, or jumping earned → sent with no
//!   record, requires the caller's acknowledgement flag up front for
//!   the whole selection, before anything is written;
//! - target earned deletes the record (idempotent);
//! - the edge *into* sent notifies the member, verified emails only.

use std::collections::{HashMap, HashSet};

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::award::resolve_status;
use crate::models::flash::{qualifying_days, threshold_date};
use crate::models::{
    AuditEntry, AwardFulfillment, AwardRow, AwardStatus, AwardTier, Flash, FulfillmentStatus, User,
};
use crate::services::Mailer;

// ─── Aggregation ─────────────────────────────────────────────────

/// Award dashboard service.
#[derive(Clone)]
pub struct AwardService {
    db: FirestoreDb,
}

impl AwardService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Produce one row per (member, tier) for the year: every tier the
    /// member currently meets, plus every tier anchored by a fulfillment
    /// record even when the count has since dropped ("lost" tiers must
    /// surface for admin review).
    ///
    /// Pure read; three queries, merged in memory.
    pub async fn aggregate(&self, year: i32) -> Result<Vec<AwardRow>> {
        let users = self.db.list_users().await?;
        let flashes = self.db.get_flashes_for_year(year).await?;
        let records = self.db.get_fulfillments_for_year(year).await?;

        let mut flashes_by_user: HashMap<u64, Vec<Flash>> = HashMap::new();
        for flash in flashes {
            flashes_by_user.entry(flash.user_id).or_default().push(flash);
        }

        let mut records_by_pair: HashMap<(u64, AwardTier), AwardFulfillment> = HashMap::new();
        for record in records {
            records_by_pair.insert((record.user_id, record.tier), record);
        }

        let empty: Vec<Flash> = Vec::new();
        let mut rows = Vec::new();

        for user in &users {
            let user_flashes = flashes_by_user.get(&user.user_id).unwrap_or(&empty);
            let total_days = qualifying_days(user_flashes);

            for tier in AwardTier::ALL {
                let record = records_by_pair.get(&(user.user_id, tier));
                let Some((status, discrepancy)) = resolve_status(total_days, tier, record) else {
                    continue;
                };

                rows.push(AwardRow {
                    user_id: user.user_id,
                    name: user.display_name(),
                    email: user.email.clone(),
                    tier,
                    total_days,
                    status,
                    discrepancy,
                    threshold_date: threshold_date(user_flashes, tier.threshold()),
                });
            }
        }

        rows.sort_by(|a, b| {
            (a.name.to_lowercase(), a.tier.threshold())
                .cmp(&(b.name.to_lowercase(), b.tier.threshold()))
        });

        Ok(rows)
    }

    /// Apply a bulk status transition to the selected (member, tier)
    /// pairs. Validates the whole selection, plans every write, then
    /// applies the plan, notifies on the sent edge, and records one
    /// audit entry.
    pub async fn bulk_transition(
        &self,
        mailer: &Mailer,
        actor: &User,
        year: i32,
        selection: &[(u64, AwardTier)],
        target: TransitionTarget,
        acknowledge: bool,
    ) -> Result<BulkOutcome> {
        if selection.is_empty() {
            return Err(AppError::BadRequest("Empty selection".to_string()));
        }

        // Resolve every member up front; unknown IDs reject the whole
        // request before any mutation.
        let mut user_ids: Vec<u64> = selection.iter().map(|(id, _)| *id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut users: HashMap<u64, User> = HashMap::new();
        for maybe_user in self.db.get_users_batch(&user_ids).await? {
            match maybe_user {
                Some(user) => {
                    users.insert(user.user_id, user);
                }
                None => {
                    return Err(AppError::BadRequest(
                        "Selection contains an unknown member".to_string(),
                    ))
                }
            }
        }

        let mut days_by_user: HashMap<u64, u32> = HashMap::new();
        for user_id in &user_ids {
            let flashes = self.db.get_flashes_for_user_year(*user_id, year).await?;
            days_by_user.insert(*user_id, qualifying_days(&flashes));
        }

        let mut records: HashMap<(u64, AwardTier), AwardFulfillment> = HashMap::new();
        let mut inputs = Vec::with_capacity(selection.len());
        for (user_id, tier) in selection {
            let record = self.db.get_fulfillment(*user_id, year, *tier).await?;
            let current = record.as_ref().map(|r| r.status);
            if let Some(record) = record {
                records.insert((*user_id, *tier), record);
            }
            inputs.push(TransitionInput {
                user_id: *user_id,
                tier: *tier,
                current,
                total_days: days_by_user[user_id],
                email_verified: users[user_id].email_verified,
            });
        }

        let plan = plan_transition(&inputs, target, acknowledge)?;
        let now = chrono::Utc::now().to_rfc3339();

        for item in &plan.items {
            let key = (item.user_id, item.tier);
            match &item.write {
                PlannedWrite::Create(status) => {
                    let record = AwardFulfillment {
                        user_id: item.user_id,
                        year,
                        tier: item.tier,
                        status: *status,
                        days_at_creation: days_by_user[&item.user_id],
                        created_at: now.clone(),
                        updated_at: now.clone(),
                    };
                    self.db.upsert_fulfillment(&record).await?;
                }
                PlannedWrite::Update(status) => {
                    // Planned updates always have a loaded record.
                    let mut record = records
                        .get(&key)
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("Planned update without record"))?;
                    record.status = *status;
                    record.updated_at = now.clone();
                    self.db.upsert_fulfillment(&record).await?;
                }
                PlannedWrite::Delete => {
                    self.db
                        .delete_fulfillment(item.user_id, year, item.tier)
                        .await?;
                }
                PlannedWrite::Keep => continue,
            }

            if item.notify {
                let user = &users[&item.user_id];
                if let Err(e) = mailer
                    .send_award_sent(&user.email, &user.display_name(), item.tier, year)
                    .await
                {
                    // Status change already applied; a mail outage should
                    // not roll back the bulk action.
                    tracing::warn!(
                        user_id = item.user_id,
                        error = %e,
                        "Award notification failed"
                    );
                }
            }
        }

        let changes: Vec<String> = plan
            .items
            .iter()
            .filter_map(|item| item.description.clone())
            .collect();

        let entry = AuditEntry {
            actor_id: actor.user_id,
            actor_name: actor.display_name(),
            action: "award_bulk_transition".to_string(),
            year,
            changes,
            updated: plan.updated,
            unchanged: plan.unchanged,
            created_at: now,
        };
        self.db.append_audit_entry(&entry).await?;

        tracing::info!(
            actor_id = actor.user_id,
            year,
            updated = plan.updated,
            unchanged = plan.unchanged,
            "Bulk award transition applied"
        );

        Ok(BulkOutcome {
            updated: plan.updated,
            unchanged: plan.unchanged,
        })
    }
}

// ─── Transition planning ─────────────────────────────────────────

/// Requested target state for a bulk transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTarget {
    /// Delete the fulfillment record (back to implicit earned)
    Earned,
    Processing,
    Sent,
}

/// Per-pair input to the planner.
#[derive(Debug, Clone)]
pub struct TransitionInput {
    pub user_id: u64,
    pub tier: AwardTier,
    /// Persisted status, `None` when no record exists
    pub current: Option<FulfillmentStatus>,
    /// Current capped qualifying-day count
    pub total_days: u32,
    pub email_verified: bool,
}

/// Database write planned for one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedWrite {
    Create(FulfillmentStatus),
    Update(FulfillmentStatus),
    Delete,
    /// No write: already in the target state, or skipped as unqualified
    Keep,
}

/// Planned outcome for one pair.
#[derive(Debug, Clone)]
pub struct PlannedItem {
    pub user_id: u64,
    pub tier: AwardTier,
    pub write: PlannedWrite,
    /// Send the award notification after the write (sent edge, verified
    /// email only)
    pub notify: bool,
    /// Audit description, present iff the pair changes
    pub description: Option<String>,
}

/// Full plan for a bulk transition.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub items: Vec<PlannedItem>,
    pub updated: u32,
    pub unchanged: u32,
}

/// Caller-facing counts for a bulk transition.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BulkOutcome {
    pub updated: u32,
    pub unchanged: u32,
}

/// Plan a bulk transition without touching the database.
///
/// Acknowledgement is checked over the entire selection first, so a
/// rejected request mutates nothing.
pub fn plan_transition(
    inputs: &[TransitionInput],
    target: TransitionTarget,
    acknowledge: bool,
) -> Result<TransitionPlan> {
    if inputs.is_empty() {
        return Err(AppError::BadRequest("Empty selection".to_string()));
    }

    // A repeated (member, tier) pair collapses to one planned write, so
    // duplicates cannot inflate the counts or double-notify.
    let mut seen = HashSet::new();
    let inputs: Vec<&TransitionInput> = inputs
        .iter()
        .filter(|input| seen.insert((input.user_id, input.tier)))
        .collect();

    let needs_ack = inputs.iter().any(|input| match (input.current, target) {
        // Downgrading an already-sent award
        (Some(FulfillmentStatus::Sent), TransitionTarget::Processing) => true,
        // Jumping straight from earned to sent, skipping processing
        (None, TransitionTarget::Sent) => true,
        _ => false,
    });
    if needs_ack && !acknowledge {
        return Err(AppError::AcknowledgementRequired(
            "Selection includes a sent-award downgrade or a direct earned → sent \
             transition; resubmit with acknowledgement"
                .to_string(),
        ));
    }

    let mut items = Vec::with_capacity(inputs.len());
    let mut updated = 0u32;
    let mut unchanged = 0u32;

    for input in inputs {
        let current_label = match input.current {
            Some(status) => AwardStatus::from(status).to_string(),
            None => AwardStatus::Earned.to_string(),
        };

        let (write, notify, description) = match (input.current, target) {
            // Reset to earned: delete the record if one exists.
            (Some(_), TransitionTarget::Earned) => (
                PlannedWrite::Delete,
                false,
                Some(format!(
                    "user {} tier {}: {} → earned (record removed)",
                    input.user_id, input.tier, current_label
                )),
            ),
            (None, TransitionTarget::Earned) => (PlannedWrite::Keep, false, None),

            // No record yet: create only when the member qualifies.
            (None, TransitionTarget::Processing) | (None, TransitionTarget::Sent) => {
                if input.total_days < input.tier.threshold() {
                    (PlannedWrite::Keep, false, None)
                } else {
                    let status = match target {
                        TransitionTarget::Sent => FulfillmentStatus::Sent,
                        _ => FulfillmentStatus::Processing,
                    };
                    let notify =
                        status == FulfillmentStatus::Sent && input.email_verified;
                    (
                        PlannedWrite::Create(status),
                        notify,
                        Some(format!(
                            "user {} tier {}: earned → {}",
                            input.user_id,
                            input.tier,
                            AwardStatus::from(status)
                        )),
                    )
                }
            }

            // Existing record: transition unconditionally, either direction.
            (Some(current), TransitionTarget::Processing)
            | (Some(current), TransitionTarget::Sent) => {
                let status = match target {
                    TransitionTarget::Sent => FulfillmentStatus::Sent,
                    _ => FulfillmentStatus::Processing,
                };
                if current == status {
                    (PlannedWrite::Keep, false, None)
                } else {
                    let notify = status == FulfillmentStatus::Sent
                        && current != FulfillmentStatus::Sent
                        && input.email_verified;
                    (
                        PlannedWrite::Update(status),
                        notify,
                        Some(format!(
                            "user {} tier {}: {} → {}",
                            input.user_id,
                            input.tier,
                            current_label,
                            AwardStatus::from(status)
                        )),
                    )
                }
            }
        };

        if write == PlannedWrite::Keep {
            unchanged += 1;
        } else {
            updated += 1;
        }

        items.push(PlannedItem {
            user_id: input.user_id,
            tier: input.tier,
            write,
            notify,
            description,
        });
    }

    Ok(TransitionPlan {
        items,
        updated,
        unchanged,
    })
}

// ─── Filtering ───────────────────────────────────────────────────

/// Status filter for dashboard rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Anything except sent
    Pending,
    Exact(AwardStatus),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "earned" => Ok(StatusFilter::Exact(AwardStatus::Earned)),
            "processing" => Ok(StatusFilter::Exact(AwardStatus::Processing)),
            "sent" => Ok(StatusFilter::Exact(AwardStatus::Sent)),
            other => Err(AppError::BadRequest(format!(
                "Invalid status filter: {}",
                other
            ))),
        }
    }

    fn matches(&self, status: AwardStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status != AwardStatus::Sent,
            StatusFilter::Exact(wanted) => status == *wanted,
        }
    }
}

/// Tier filter for dashboard rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TierFilter {
    #[default]
    All,
    Exact(AwardTier),
}

impl TierFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == "all" {
            return Ok(TierFilter::All);
        }
        let value: u32 = raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid tier filter: {}", raw)))?;
        let tier = AwardTier::try_from(value).map_err(AppError::BadRequest)?;
        Ok(TierFilter::Exact(tier))
    }

    fn matches(&self, tier: AwardTier) -> bool {
        match self {
            TierFilter::All => true,
            TierFilter::Exact(wanted) => tier == *wanted,
        }
    }
}

/// Composable narrowing of the aggregated row list. Pure; never touches
/// persistence.
#[derive(Debug, Clone, Default)]
pub struct AwardFilter {
    pub status: StatusFilter,
    pub tier: TierFilter,
    /// Case-insensitive substring match over name and email
    pub search: Option<String>,
}

impl AwardFilter {
    pub fn apply(&self, rows: Vec<AwardRow>) -> Vec<AwardRow> {
        let needle = self.search.as_ref().map(|s| s.to_lowercase());

        rows.into_iter()
            .filter(|row| {
                self.status.matches(row.status)
                    && self.tier.matches(row.tier)
                    && needle.as_ref().is_none_or(|n| {
                        row.name.to_lowercase().contains(n)
                            || row.email.to_lowercase().contains(n)
                    })
            })
            .collect()
    }
}

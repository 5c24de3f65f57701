// SPDX-License-Identifier: MIT

//! Award tiers, fulfillment records, and the derived award row.
//!
//! An award "row" is what the admin dashboard displays for one
//! (member, tier) pair: the live capped day count merged with any
//! persisted fulfillment record. The merge is a pure function so the
//! status/discrepancy rules can be tested without a database:
//!
//! - a fulfillment record's status always wins (processing/sent);
//! - no record means "earned" (implicitly, by qualifying);
//! - discrepancy is flagged when a record exists but the current count
//!   no longer meets the tier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three award tiers, by qualifying-day threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AwardTier {
    Ten,
    TwentyFive,
    Fifty,
}

impl AwardTier {
    pub const ALL: [AwardTier; 3] = [AwardTier::Ten, AwardTier::TwentyFive, AwardTier::Fifty];

    /// Qualifying-day threshold for this tier.
    pub fn threshold(&self) -> u32 {
        match self {
            AwardTier::Ten => 10,
            AwardTier::TwentyFive => 25,
            AwardTier::Fifty => 50,
        }
    }
}

impl From<AwardTier> for u32 {
    fn from(tier: AwardTier) -> u32 {
        tier.threshold()
    }
}

impl TryFrom<u32> for AwardTier {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(AwardTier::Ten),
            25 => Ok(AwardTier::TwentyFive),
            50 => Ok(AwardTier::Fifty),
            other => Err(format!("unknown award tier: {}", other)),
        }
    }
}

impl std::fmt::Display for AwardTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.threshold())
    }
}

/// Persisted fulfillment status. Absence of a record means the tier is
/// earned but unprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Processing,
    Sent,
}

/// Display status of an award row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardStatus {
    Earned,
    Processing,
    Sent,
}

impl From<FulfillmentStatus> for AwardStatus {
    fn from(status: FulfillmentStatus) -> Self {
        match status {
            FulfillmentStatus::Processing => AwardStatus::Processing,
            FulfillmentStatus::Sent => AwardStatus::Sent,
        }
    }
}

impl std::fmt::Display for AwardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AwardStatus::Earned => "earned",
            AwardStatus::Processing => "processing",
            AwardStatus::Sent => "sent",
        };
        f.write_str(s)
    }
}

/// Fulfillment record stored in Firestore, one per (member, year, tier).
///
/// Created only when an admin first marks the tier as processing or sent;
/// deleted when the tier is reset to earned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardFulfillment {
    /// Owning member ID
    pub user_id: u64,
    /// Award year
    pub year: i32,
    /// Award tier
    pub tier: AwardTier,
    /// Current fulfillment status
    pub status: FulfillmentStatus,
    /// The member's capped day count when the record was created
    pub days_at_creation: u32,
    /// When the record was created (RFC 3339)
    pub created_at: String,
    /// When the status last changed (RFC 3339)
    pub updated_at: String,
}

impl AwardFulfillment {
    /// Firestore document ID: one document per (member, year, tier).
    pub fn doc_id(user_id: u64, year: i32, tier: AwardTier) -> String {
        format!("{}_{}_{}", user_id, year, tier.threshold())
    }
}

/// Derived dashboard row for one (member, tier) pair. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AwardRow {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub tier: AwardTier,
    /// Current capped qualifying-day count for the year
    pub total_days: u32,
    pub status: AwardStatus,
    /// True when a record exists but the current count no longer meets
    /// the tier (the award was processed at a count the member has since
    /// lost).
    pub discrepancy: bool,
    /// Date the cumulative count first reached the tier; `None` when the
    /// tier is not currently met.
    pub threshold_date: Option<NaiveDate>,
}

/// Merge a live day count with an optional fulfillment record.
///
/// Returns `None` when no row should be shown: the member neither meets
/// the tier nor has a record anchoring it.
pub fn resolve_status(
    total_days: u32,
    tier: AwardTier,
    record: Option<&AwardFulfillment>,
) -> Option<(AwardStatus, bool)> {
    match record {
        Some(rec) => {
            let discrepancy = total_days < tier.threshold();
            Some((rec.status.into(), discrepancy))
        }
        None if total_days >= tier.threshold() => Some((AwardStatus::Earned, false)),
        None => None,
    }
}

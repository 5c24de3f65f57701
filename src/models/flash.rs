// SPDX-License-Identifier: MIT

//! Flash (activity entry) model and qualifying-day counting.
//!
//! A flash records one day of club activity. At most one flash exists per
//! member per calendar date; the Firestore document ID (`{user_id}_{date}`)
//! enforces this.
//!
//! Day counting toward award tiers is capped: per member per year, at most
//! five non-sailing days (maintenance + race committee) count; sailing days
//! are uncapped. The cap is consumed in date order so threshold dates are
//! stable when later entries change.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Non-sailing days (maintenance + race committee) counting toward award
/// tiers are capped at this many per member per year.
pub const NON_SAILING_CAP: u32 = 5;

/// Kind of club activity logged for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Sailing,
    Maintenance,
    RaceCommittee,
}

impl ActivityKind {
    /// Whether days of this kind consume the non-sailing cap.
    pub fn is_capped(&self) -> bool {
        !matches!(self, ActivityKind::Sailing)
    }
}

/// Sailing-event subtype, meaningful only when the kind is `Sailing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SailingEvent {
    ClubRace,
    Regatta,
    Cruise,
    DaySail,
}

/// Stored flash record in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    /// Owning member ID
    pub user_id: u64,
    /// Calendar date of the activity
    pub date: NaiveDate,
    /// Year of `date`, denormalized for Firestore queries
    pub year: i32,
    /// Activity kind
    pub kind: ActivityKind,
    /// Sailing-event subtype (sailing days only)
    pub sailing_event: Option<SailingEvent>,
    /// When this flash was logged or last edited (RFC 3339)
    pub logged_at: String,
}

impl Flash {
    /// Firestore document ID: one document per (member, date).
    pub fn doc_id(user_id: u64, date: NaiveDate) -> String {
        format!("{}_{}", user_id, date.format("%Y-%m-%d"))
    }
}

/// Running capped day count in date order: one `(date, cumulative)` entry
/// per flash that counted.
///
/// Flashes that fall outside the cap produce no entry, so the final
/// cumulative value is the member's capped total for the year.
pub fn cumulative_days(flashes: &[Flash]) -> Vec<(NaiveDate, u32)> {
    let mut sorted: Vec<&Flash> = flashes.iter().collect();
    sorted.sort_by_key(|f| f.date);

    let mut non_sailing_used = 0u32;
    let mut total = 0u32;
    let mut out = Vec::new();

    for flash in sorted {
        if flash.kind.is_capped() {
            if non_sailing_used >= NON_SAILING_CAP {
                continue;
            }
            non_sailing_used += 1;
        }
        total += 1;
        out.push((flash.date, total));
    }

    out
}

/// Capped qualifying-day total for a member's flashes in one year.
pub fn qualifying_days(flashes: &[Flash]) -> u32 {
    cumulative_days(flashes).last().map(|(_, n)| *n).unwrap_or(0)
}

/// The date the cumulative capped count first reached `threshold`, if it
/// ever did.
pub fn threshold_date(flashes: &[Flash], threshold: u32) -> Option<NaiveDate> {
    cumulative_days(flashes)
        .iter()
        .find(|(_, n)| *n >= threshold)
        .map(|(date, _)| *date)
}

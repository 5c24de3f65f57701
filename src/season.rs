// SPDX-License-Identifier: MIT

//! Calendar rules for the logbook.
//!
//! Flashes are editable within the current year only, except during
//! January when the previous year may still be corrected (the grace
//! period, so members can finish their December entries before awards
//! are reviewed).

use chrono::{Datelike, NaiveDate};

/// Grace period: during January, the previous year is still editable.
const GRACE_MONTH: u32 = 1;

/// Years whose flashes may currently be created, edited, or deleted.
pub fn editable_years(today: NaiveDate) -> Vec<i32> {
    let mut years = vec![today.year()];
    if today.month() == GRACE_MONTH {
        years.push(today.year() - 1);
    }
    years
}

/// Whether a flash dated `date` may be modified as of `today`.
///
/// Future dates are never editable; a flash records a day that happened.
pub fn is_editable(date: NaiveDate, today: NaiveDate) -> bool {
    date <= today && editable_years(today).contains(&date.year())
}

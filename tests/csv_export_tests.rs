// SPDX-License-Identifier: MIT

//! CSV export encoding tests (no database).

use chrono::{NaiveDate, TimeZone, Utc};
use flashlog::models::{AwardStatus, AwardTier};
use flashlog::services::export::{encode_batch, export_filename, ExportRow, CSV_HEADER, UTF8_BOM};

fn sample_row() -> ExportRow {
    ExportRow {
        name: "Ada Lovelace".to_string(),
        fleet: "Fleet 12".to_string(),
        district: "District 6".to_string(),
        email: "ada@example.org".to_string(),
        street: "1 Harbor Way".to_string(),
        city: "Alameda".to_string(),
        state: "CA".to_string(),
        zip: "94501".to_string(),
        tier: AwardTier::Ten,
        total_days: 14,
        threshold_date: NaiveDate::from_ymd_opt(2026, 5, 10),
        status: AwardStatus::Processing,
    }
}

#[test]
fn test_header_row_column_names() {
    let bytes = encode_batch(&[], true).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert_eq!(
        text.trim_end(),
        CSV_HEADER.join(","),
        "header must use the fixed column names"
    );
    assert!(text.starts_with("Name,Fleet,District,Email"));
}

#[test]
fn test_row_encoding() {
    let bytes = encode_batch(&[sample_row()], false).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert_eq!(
        text.trim_end(),
        "Ada Lovelace,Fleet 12,District 6,ada@example.org,1 Harbor Way,Alameda,CA,94501,10,14,2026-05-10,processing"
    );
}

#[test]
fn test_fields_with_commas_and_quotes_are_quoted() {
    let mut row = sample_row();
    row.name = "Lovelace, Ada".to_string();
    row.street = "1 \"Harbor\" Way".to_string();

    let bytes = encode_batch(&[row], false).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.contains("\"Lovelace, Ada\""));
    assert!(text.contains("\"1 \"\"Harbor\"\" Way\""));
}

#[test]
fn test_missing_threshold_date_is_blank() {
    let mut row = sample_row();
    row.threshold_date = None;
    row.total_days = 8;

    let bytes = encode_batch(&[row], false).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(text.contains(",8,,processing"));
}

#[test]
fn test_bom_bytes() {
    assert_eq!(UTF8_BOM, &[0xEF, 0xBB, 0xBF]);
    assert_eq!(UTF8_BOM, "\u{feff}".as_bytes());
}

#[test]
fn test_export_filename_embeds_year_and_timestamp() {
    let now = Utc.with_ymd_and_hms(2026, 8, 27, 10, 15, 0).unwrap();
    assert_eq!(
        export_filename(2026, now),
        "flash-awards-2026-20260827T101500Z.csv"
    );
}

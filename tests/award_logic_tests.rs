// SPDX-License-Identifier: MIT

//! Award state machine and filter properties, exercised without a
//! database through the pure planning and resolution functions.

use flashlog::models::award::resolve_status;
use flashlog::models::{AwardFulfillment, AwardRow, AwardStatus, AwardTier, FulfillmentStatus};
use flashlog::services::awards::{
    plan_transition, AwardFilter, PlannedWrite, StatusFilter, TierFilter, TransitionInput,
    TransitionTarget,
};

fn input(
    user_id: u64,
    tier: AwardTier,
    current: Option<FulfillmentStatus>,
    total_days: u32,
    email_verified: bool,
) -> TransitionInput {
    TransitionInput {
        user_id,
        tier,
        current,
        total_days,
        email_verified,
    }
}

fn record(user_id: u64, tier: AwardTier, status: FulfillmentStatus) -> AwardFulfillment {
    AwardFulfillment {
        user_id,
        year: 2026,
        tier,
        status,
        days_at_creation: tier.threshold(),
        created_at: "2026-06-01T00:00:00Z".to_string(),
        updated_at: "2026-06-01T00:00:00Z".to_string(),
    }
}

// ─── Planning: creation ──────────────────────────────────────

#[test]
fn test_underqualified_pair_is_skipped_not_errored() {
    let inputs = vec![input(1, AwardTier::Ten, None, 8, true)];
    let plan = plan_transition(&inputs, TransitionTarget::Processing, false).unwrap();

    assert_eq!(plan.updated, 0);
    assert_eq!(plan.unchanged, 1);
    assert_eq!(plan.items[0].write, PlannedWrite::Keep);
    assert!(plan.items[0].description.is_none());
}

#[test]
fn test_qualified_pair_creates_processing_record() {
    let inputs = vec![input(1, AwardTier::Ten, None, 10, true)];
    let plan = plan_transition(&inputs, TransitionTarget::Processing, false).unwrap();

    assert_eq!(plan.updated, 1);
    assert_eq!(
        plan.items[0].write,
        PlannedWrite::Create(FulfillmentStatus::Processing)
    );
    assert!(!plan.items[0].notify);
}

#[test]
fn test_direct_sent_requires_acknowledgement() {
    let inputs = vec![input(1, AwardTier::Ten, None, 12, true)];

    let err = plan_transition(&inputs, TransitionTarget::Sent, false).unwrap_err();
    assert!(matches!(
        err,
        flashlog::error::AppError::AcknowledgementRequired(_)
    ));

    let plan = plan_transition(&inputs, TransitionTarget::Sent, true).unwrap();
    assert_eq!(
        plan.items[0].write,
        PlannedWrite::Create(FulfillmentStatus::Sent)
    );
    assert!(plan.items[0].notify);
}

// ─── Planning: existing records ──────────────────────────────

#[test]
fn test_existing_record_updates_regardless_of_qualification() {
    // The member has since dropped to 3 days; the record still moves.
    let inputs = vec![input(
        1,
        AwardTier::Ten,
        Some(FulfillmentStatus::Processing),
        3,
        true,
    )];
    let plan = plan_transition(&inputs, TransitionTarget::Sent, false).unwrap();

    assert_eq!(plan.updated, 1);
    assert_eq!(
        plan.items[0].write,
        PlannedWrite::Update(FulfillmentStatus::Sent)
    );
    assert!(plan.items[0].notify);
}

#[test]
fn test_downgrade_requires_acknowledgement() {
    let inputs = vec![input(
        1,
        AwardTier::Ten,
        Some(FulfillmentStatus::Sent),
        10,
        true,
    )];

    let err = plan_transition(&inputs, TransitionTarget::Processing, false).unwrap_err();
    assert!(matches!(
        err,
        flashlog::error::AppError::AcknowledgementRequired(_)
    ));

    let plan = plan_transition(&inputs, TransitionTarget::Processing, true).unwrap();
    assert_eq!(
        plan.items[0].write,
        PlannedWrite::Update(FulfillmentStatus::Processing)
    );
}

#[test]
fn test_acknowledgement_checked_over_whole_selection() {
    // One harmless pair plus one downgrade: without acknowledgement the
    // whole request is rejected, nothing is partially planned.
    let inputs = vec![
        input(1, AwardTier::Ten, Some(FulfillmentStatus::Processing), 10, true),
        input(2, AwardTier::Ten, Some(FulfillmentStatus::Sent), 10, true),
    ];
    assert!(plan_transition(&inputs, TransitionTarget::Processing, false).is_err());
}

#[test]
fn test_already_in_target_state_is_unchanged() {
    let inputs = vec![input(
        1,
        AwardTier::Ten,
        Some(FulfillmentStatus::Sent),
        10,
        true,
    )];
    let plan = plan_transition(&inputs, TransitionTarget::Sent, false).unwrap();

    assert_eq!(plan.updated, 0);
    assert_eq!(plan.unchanged, 1);
    assert_eq!(plan.items[0].write, PlannedWrite::Keep);
    // Repeating mark-as-sent sends no further notification.
    assert!(!plan.items[0].notify);
}

#[test]
fn test_reset_to_earned() {
    let inputs = vec![
        input(1, AwardTier::Ten, Some(FulfillmentStatus::Sent), 10, true),
        input(2, AwardTier::Ten, None, 10, true),
    ];
    let plan = plan_transition(&inputs, TransitionTarget::Earned, false).unwrap();

    assert_eq!(plan.items[0].write, PlannedWrite::Delete);
    // No record to delete: idempotent no-op.
    assert_eq!(plan.items[1].write, PlannedWrite::Keep);
    assert_eq!(plan.updated, 1);
    assert_eq!(plan.unchanged, 1);
}

#[test]
fn test_empty_selection_rejected() {
    assert!(plan_transition(&[], TransitionTarget::Processing, false).is_err());
}

#[test]
fn test_duplicate_pair_planned_once() {
    // The same (member, tier) pair selected twice is one logical
    // transition: one write, one count, one notification.
    let inputs = vec![
        input(1, AwardTier::Ten, Some(FulfillmentStatus::Processing), 12, true),
        input(1, AwardTier::Ten, Some(FulfillmentStatus::Processing), 12, true),
    ];
    let plan = plan_transition(&inputs, TransitionTarget::Sent, false).unwrap();

    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.updated, 1);
    assert_eq!(plan.unchanged, 0);
    assert_eq!(plan.items.iter().filter(|i| i.notify).count(), 1);
}

// ─── Notifications ───────────────────────────────────────────

#[test]
fn test_unverified_email_suppresses_notification_not_transition() {
    let inputs = vec![input(
        1,
        AwardTier::Ten,
        Some(FulfillmentStatus::Processing),
        10,
        false,
    )];
    let plan = plan_transition(&inputs, TransitionTarget::Sent, false).unwrap();

    assert_eq!(
        plan.items[0].write,
        PlannedWrite::Update(FulfillmentStatus::Sent)
    );
    assert!(!plan.items[0].notify);
    assert_eq!(plan.updated, 1);
}

#[test]
fn test_two_users_two_tiers_two_notifications() {
    let inputs = vec![
        input(1, AwardTier::Ten, Some(FulfillmentStatus::Processing), 12, true),
        input(2, AwardTier::TwentyFive, Some(FulfillmentStatus::Processing), 30, true),
    ];
    let plan = plan_transition(&inputs, TransitionTarget::Sent, false).unwrap();

    let notifications = plan.items.iter().filter(|i| i.notify).count();
    assert_eq!(notifications, 2);
}

// ─── Status resolution ───────────────────────────────────────

#[test]
fn test_earned_row_disappears_when_count_drops_without_record() {
    // 10 days, no record: earned, no discrepancy.
    let (status, discrepancy) = resolve_status(10, AwardTier::Ten, None).unwrap();
    assert_eq!(status, AwardStatus::Earned);
    assert!(!discrepancy);

    // Down to 8 days with no record: no row at all.
    assert!(resolve_status(8, AwardTier::Ten, None).is_none());

    // But an existing processing record anchors the row with a
    // discrepancy.
    let rec = record(1, AwardTier::Ten, FulfillmentStatus::Processing);
    let (status, discrepancy) = resolve_status(8, AwardTier::Ten, Some(&rec)).unwrap();
    assert_eq!(status, AwardStatus::Processing);
    assert!(discrepancy);
}

// ─── Filtering ───────────────────────────────────────────────

fn row(name: &str, email: &str, tier: AwardTier, status: AwardStatus) -> AwardRow {
    AwardRow {
        user_id: 1,
        name: name.to_string(),
        email: email.to_string(),
        tier,
        total_days: tier.threshold(),
        status,
        discrepancy: false,
        threshold_date: None,
    }
}

#[test]
fn test_pending_filter_excludes_sent_only() {
    let rows = vec![
        row("Ada", "ada@example.org", AwardTier::Ten, AwardStatus::Earned),
        row("Ben", "ben@example.org", AwardTier::Ten, AwardStatus::Processing),
        row("Cam", "cam@example.org", AwardTier::Ten, AwardStatus::Sent),
    ];

    let filter = AwardFilter {
        status: StatusFilter::Pending,
        ..Default::default()
    };
    let filtered = filter.apply(rows);

    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|r| r.status != AwardStatus::Sent));
}

#[test]
fn test_tier_filter() {
    let rows = vec![
        row("Ada", "ada@example.org", AwardTier::Ten, AwardStatus::Earned),
        row("Ada", "ada@example.org", AwardTier::TwentyFive, AwardStatus::Earned),
    ];

    let filter = AwardFilter {
        tier: TierFilter::Exact(AwardTier::TwentyFive),
        ..Default::default()
    };
    let filtered = filter.apply(rows);

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].tier, AwardTier::TwentyFive);
}

#[test]
fn test_search_matches_name_and_email_case_insensitive() {
    let rows = vec![
        row("Ada Lovelace", "ada@example.org", AwardTier::Ten, AwardStatus::Earned),
        row("Ben Franklin", "ben@club.org", AwardTier::Ten, AwardStatus::Earned),
    ];

    let by_name = AwardFilter {
        search: Some("LOVELACE".to_string()),
        ..Default::default()
    };
    assert_eq!(by_name.apply(rows.clone()).len(), 1);

    let by_email = AwardFilter {
        search: Some("club.org".to_string()),
        ..Default::default()
    };
    assert_eq!(by_email.apply(rows.clone()).len(), 1);

    let no_match = AwardFilter {
        search: Some("zzz".to_string()),
        ..Default::default()
    };
    assert!(no_match.apply(rows).is_empty());
}

#[test]
fn test_filters_compose() {
    let rows = vec![
        row("Ada", "ada@example.org", AwardTier::Ten, AwardStatus::Sent),
        row("Ada", "ada@example.org", AwardTier::TwentyFive, AwardStatus::Earned),
        row("Ben", "ben@example.org", AwardTier::TwentyFive, AwardStatus::Earned),
    ];

    let filter = AwardFilter {
        status: StatusFilter::Exact(AwardStatus::Earned),
        tier: TierFilter::Exact(AwardTier::TwentyFive),
        search: Some("ada".to_string()),
    };
    let filtered = filter.apply(rows);

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].name, "Ada");
}

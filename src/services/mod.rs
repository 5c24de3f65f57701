// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod awards;
pub mod export;
pub mod mailer;
pub mod passwords;

pub use awards::{AwardFilter, AwardService, BulkOutcome, StatusFilter, TierFilter, TransitionTarget};
pub use export::ExportService;
pub use mailer::{Mailer, OutboundEmail};

// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod audit;
pub mod award;
pub mod flash;
pub mod membership;
pub mod user;

pub use audit::AuditEntry;
pub use award::{AwardFulfillment, AwardRow, AwardStatus, AwardTier, FulfillmentStatus};
pub use flash::{ActivityKind, Flash, SailingEvent};
pub use membership::Membership;
pub use user::User;

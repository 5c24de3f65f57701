// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (member profiles)
//! - Flashes (one activity entry per member per day)
//! - Memberships (yearly district/fleet affiliation)
//! - Award fulfillments (admin-tracked award state)
//! - Audit logs (one entry per bulk admin action)

use chrono::NaiveDate;
use futures_util::{stream, StreamExt};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{AuditEntry, AwardFulfillment, AwardTier, Flash, Membership, User};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a member by ID.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a member by email (login identity).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let mut matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("email").eq(email.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.pop())
    }

    /// List all members.
    ///
    /// The club roster is small (hundreds); this is only used by the
    /// admin aggregate and the leaderboard.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a member.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.user_id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Flash Operations ────────────────────────────────────────

    /// Get a member's flash for a specific date.
    pub async fn get_flash(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<Flash>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FLASHES)
            .obj()
            .one(&Flash::doc_id(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a flash.
    ///
    /// The document ID is `{user_id}_{date}`, so writing an existing
    /// (member, date) pair replaces it; one flash per day holds by
    /// construction.
    pub async fn upsert_flash(&self, flash: &Flash) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FLASHES)
            .document_id(Flash::doc_id(flash.user_id, flash.date))
            .object(flash)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a member's flash for a date.
    pub async fn delete_flash(&self, user_id: u64, date: NaiveDate) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FLASHES)
            .document_id(Flash::doc_id(user_id, date))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get one member's flashes for a year, in date order.
    pub async fn get_flashes_for_user_year(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<Vec<Flash>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FLASHES)
            .filter(move |q| {
                q.for_all([q.field("user_id").eq(user_id), q.field("year").eq(year)])
            })
            .order_by([("date", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all flashes for a year (admin aggregate, leaderboard).
    pub async fn get_flashes_for_year(&self, year: i32) -> Result<Vec<Flash>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FLASHES)
            .filter(move |q| q.field("year").eq(year))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Membership Operations ───────────────────────────────────

    /// Get a member's affiliation record for a year.
    pub async fn get_membership(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<Option<Membership>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::MEMBERSHIPS)
            .obj()
            .one(&Membership::doc_id(user_id, year))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all affiliation records for a year.
    pub async fn get_memberships_for_year(&self, year: i32) -> Result<Vec<Membership>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERSHIPS)
            .filter(move |q| q.field("year").eq(year))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update an affiliation record.
    pub async fn upsert_membership(&self, membership: &Membership) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MEMBERSHIPS)
            .document_id(Membership::doc_id(membership.user_id, membership.year))
            .object(membership)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Award Fulfillment Operations ────────────────────────────

    /// Get the fulfillment record for one (member, year, tier), if any.
    pub async fn get_fulfillment(
        &self,
        user_id: u64,
        year: i32,
        tier: AwardTier,
    ) -> Result<Option<AwardFulfillment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::AWARD_FULFILLMENTS)
            .obj()
            .one(&AwardFulfillment::doc_id(user_id, year, tier))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all fulfillment records for a year.
    pub async fn get_fulfillments_for_year(
        &self,
        year: i32,
    ) -> Result<Vec<AwardFulfillment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::AWARD_FULFILLMENTS)
            .filter(move |q| q.field("year").eq(year))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a fulfillment record.
    pub async fn upsert_fulfillment(&self, record: &AwardFulfillment) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::AWARD_FULFILLMENTS)
            .document_id(AwardFulfillment::doc_id(
                record.user_id,
                record.year,
                record.tier,
            ))
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a fulfillment record (reset to earned). Idempotent.
    pub async fn delete_fulfillment(
        &self,
        user_id: u64,
        year: i32,
        tier: AwardTier,
    ) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::AWARD_FULFILLMENTS)
            .document_id(AwardFulfillment::doc_id(user_id, year, tier))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Audit Log Operations ────────────────────────────────────

    /// Append an audit entry (auto-generated document ID).
    pub async fn append_audit_entry(&self, entry: &AuditEntry) -> Result<(), AppError> {
        let _: AuditEntry = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::AUDIT_LOGS)
            .generate_document_id()
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List audit entries for a year, newest first.
    pub async fn list_audit_entries(
        &self,
        year: i32,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::AUDIT_LOGS)
            .filter(move |q| q.field("year").eq(year))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Batched Lookups ─────────────────────────────────────────

    /// Fetch several members concurrently, preserving input order.
    ///
    /// Uses bounded concurrency to avoid overloading Firestore.
    pub async fn get_users_batch(&self, user_ids: &[u64]) -> Result<Vec<Option<User>>, AppError> {
        let results: Vec<Result<Option<User>, AppError>> = stream::iter(user_ids.to_vec())
            .map(|id| async move { self.get_user(id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        results.into_iter().collect()
    }
}

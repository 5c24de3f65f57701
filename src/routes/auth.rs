// SPDX-License-Identifier: MIT

//! Registration, login, and email verification routes.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Datelike, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::{Membership, User};
use crate::services::passwords;
use crate::AppState;

/// Minimum gap between verification-email sends per address.
const RESEND_INTERVAL_MINUTES: i64 = 10;

/// Verification tokens expire after this many hours.
const VERIFY_TOKEN_HOURS: i64 = 48;

const VERIFY_PURPOSE: &str = "verify_email";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/verify", get(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub street: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub city: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub state: String,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub zip: String,
    /// District affiliation for the current year (optional)
    #[validate(length(max = 100))]
    pub district: Option<String>,
    /// Fleet affiliation for the current year (optional)
    #[validate(length(max = 100))]
    pub fleet: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user_id: u64,
    pub email: String,
    /// Verification email was queued; the account works but awards
    /// notifications only go to verified addresses.
    pub verification_sent: bool,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let email = req.email.trim().to_lowercase();
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest(
            "Email address already registered".to_string(),
        ));
    }

    let user_id = generate_user_id()?;
    let hashed = passwords::hash_password(&req.password)?;
    let now = Utc::now();

    let user = User {
        user_id,
        email: email.clone(),
        email_verified: false,
        password_hash: hashed.hash,
        password_salt: hashed.salt,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        street: req.street,
        city: req.city,
        state: req.state,
        zip: req.zip,
        is_admin: false,
        created_at: now.to_rfc3339(),
    };
    state.db.upsert_user(&user).await?;

    if req.district.is_some() || req.fleet.is_some() {
        let membership = Membership {
            user_id,
            year: now.year(),
            district: req.district.unwrap_or_default(),
            fleet: req.fleet.unwrap_or_default(),
        };
        state.db.upsert_membership(&membership).await?;
    }

    let verification_sent = send_verification_email(&state, &user, now).await;

    tracing::info!(user_id, "Member registered");

    Ok(Json(RegisterResponse {
        user_id,
        email,
        verification_sent,
    }))
}

/// Generate a random member ID.
fn generate_user_id() -> Result<u64> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 8];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate member ID")))?;
    // Keep IDs positive and nonzero so they survive JSON number handling.
    Ok(u64::from_be_bytes(bytes) >> 1 | 1)
}

// ─── Login / Logout ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: u64,
    pub is_admin: bool,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let email = req.email.trim().to_lowercase();
    let user = state
        .db
        .get_user_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !passwords::verify_password(&req.password, &user.password_hash, &user.password_salt) {
        tracing::warn!(user_id = user.user_id, "Failed login attempt");
        return Err(AppError::Unauthorized);
    }

    let token = create_jwt(user.user_id, user.is_admin, &state.config.jwt_signing_key)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    tracing::info!(user_id = user.user_id, "Member logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user_id: user.user_id,
            is_admin: user.is_admin,
        }),
    ))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (
        jar.remove(cookie),
        Json(serde_json::json!({ "logged_out": true })),
    )
}

// ─── Email Verification ──────────────────────────────────────

/// Claims for the short-lived email verification token.
#[derive(Serialize, Deserialize)]
struct VerifyClaims {
    sub: String,
    exp: usize,
    iat: usize,
    purpose: String,
}

fn create_verification_token(user_id: u64, signing_key: &[u8], now: DateTime<Utc>) -> Result<String> {
    let claims = VerifyClaims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(VERIFY_TOKEN_HOURS)).timestamp() as usize,
        purpose: VERIFY_PURPOSE.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Token encoding failed: {}", e)))
}

/// Send the verification email; returns whether it was handed off.
async fn send_verification_email(state: &AppState, user: &User, now: DateTime<Utc>) -> bool {
    let token = match create_verification_token(user.user_id, &state.config.jwt_signing_key, now) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(user_id = user.user_id, error = %e, "Verification token failed");
            return false;
        }
    };
    let link = format!("{}/verify?token={}", state.config.frontend_url, token);

    match state
        .mailer
        .send_verification(&user.email, &user.display_name(), &link)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            // Registration still succeeds; the member can request a resend.
            tracing::warn!(user_id = user.user_id, error = %e, "Verification email failed");
            false
        }
    }
}

#[derive(Deserialize)]
struct VerifyParams {
    token: String,
}

async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<serde_json::Value>> {
    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<VerifyClaims>(&params.token, &key, &validation)
        .map_err(|_| AppError::InvalidToken)?;

    if token_data.claims.purpose != VERIFY_PURPOSE {
        return Err(AppError::InvalidToken);
    }

    let user_id: u64 = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::InvalidToken)?;

    let mut user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    if !user.email_verified {
        user.email_verified = true;
        state.db.upsert_user(&user).await?;
        tracing::info!(user_id, "Email verified");
    }

    Ok(Json(serde_json::json!({ "verified": true })))
}

#[derive(Deserialize, Validate)]
pub struct ResendRequest {
    #[validate(email)]
    pub email: String,
}

async fn resend_verification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResendRequest>,
) -> Result<Json<serde_json::Value>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let email = req.email.trim().to_lowercase();
    let now = Utc::now();

    // Rate limit attempts (not just successful sends) per address.
    if !record_resend_attempt(&state.resend_limiter, &email, now) {
        return Err(AppError::RateLimited);
    }

    if let Some(user) = state.db.get_user_by_email(&email).await? {
        if !user.email_verified {
            send_verification_email(&state, &user, now).await;
        }
    }

    // Same response whether or not the address exists.
    Ok(Json(serde_json::json!({ "requested": true })))
}

/// Record a resend attempt; false when the address is still inside the
/// cooldown window.
fn record_resend_attempt(
    limiter: &dashmap::DashMap<String, DateTime<Utc>>,
    email: &str,
    now: DateTime<Utc>,
) -> bool {
    let mut allowed = true;
    limiter
        .entry(email.to_string())
        .and_modify(|last| {
            if now - *last < Duration::minutes(RESEND_INTERVAL_MINUTES) {
                allowed = false;
            } else {
                *last = now;
            }
        })
        .or_insert(now);
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resend_rate_limit_window() {
        let limiter = dashmap::DashMap::new();
        let t0 = Utc::now();

        assert!(record_resend_attempt(&limiter, "a@example.org", t0));
        assert!(!record_resend_attempt(
            &limiter,
            "a@example.org",
            t0 + Duration::minutes(1)
        ));
        assert!(record_resend_attempt(
            &limiter,
            "a@example.org",
            t0 + Duration::minutes(RESEND_INTERVAL_MINUTES)
        ));
    }

    #[test]
    fn test_resend_rate_limit_is_per_address() {
        let limiter = dashmap::DashMap::new();
        let t0 = Utc::now();

        assert!(record_resend_attempt(&limiter, "a@example.org", t0));
        assert!(record_resend_attempt(&limiter, "b@example.org", t0));
    }

    #[test]
    fn test_generated_ids_nonzero() {
        for _ in 0..100 {
            assert_ne!(generate_user_id().unwrap(), 0);
        }
    }
}

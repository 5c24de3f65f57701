// SPDX-License-Identifier: MIT

//! Admin gate for the award dashboard.
//!
//! Runs after `require_auth`; rejects non-admin sessions with 403 before
//! any handler touches protected data.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::middleware::auth::AuthUser;

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;

    if !auth_user.is_admin {
        tracing::warn!(user_id = auth_user.user_id, "Non-admin hit admin surface");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

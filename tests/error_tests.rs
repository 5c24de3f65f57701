// SPDX-License-Identifier: MIT

use axum::http::StatusCode;
use axum::response::IntoResponse;
use flashlog::error::AppError;

#[test]
fn test_auth_errors_map_to_401() {
    assert_eq!(
        AppError::Unauthorized.into_response().status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        AppError::InvalidToken.into_response().status(),
        StatusCode::UNAUTHORIZED
    );
}

#[test]
fn test_forbidden_maps_to_403() {
    assert_eq!(
        AppError::Forbidden.into_response().status(),
        StatusCode::FORBIDDEN
    );
}

#[test]
fn test_acknowledgement_required_is_a_bad_request() {
    let err = AppError::AcknowledgementRequired("downgrade".to_string());
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_rate_limited_maps_to_429() {
    assert_eq!(
        AppError::RateLimited.into_response().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[test]
fn test_database_detail_not_leaked() {
    let response = AppError::Database("secret connection string".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_not_found_and_bad_request() {
    assert_eq!(
        AppError::NotFound("flash".to_string()).into_response().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::BadRequest("bad".to_string()).into_response().status(),
        StatusCode::BAD_REQUEST
    );
}

// SPDX-License-Identifier: MIT

//! Flash edit-window and payload validation at the route level.
//!
//! These run against the offline app: every request here is rejected
//! before the database would be touched.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Datelike, Utc};
use tower::ServiceExt;

mod common;

fn put_flash(body: serde_json::Value, token: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/api/flashes")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_stale_year_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, false, &state.config.jwt_signing_key);

    // Two years back is outside the window in any month.
    let stale = format!("{}-06-15", Utc::now().year() - 2);
    let response = app
        .oneshot(put_flash(
            serde_json::json!({ "date": stale, "kind": "sailing" }),
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_future_date_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, false, &state.config.jwt_signing_key);

    let future = format!("{}-12-31", Utc::now().year() + 1);
    let response = app
        .oneshot(put_flash(
            serde_json::json!({ "date": future, "kind": "sailing" }),
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sailing_event_requires_sailing_kind() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, false, &state.config.jwt_signing_key);

    let today = Utc::now().date_naive().to_string();
    let response = app
        .oneshot(put_flash(
            serde_json::json!({
                "date": today,
                "kind": "maintenance",
                "sailing_event": "regatta"
            }),
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_outside_window_rejected() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(1, false, &state.config.jwt_signing_key);

    let stale = format!("{}-06-15", Utc::now().year() - 2);
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/flashes/{}", stale))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//! Integration tests for `POST /api/classify`.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn classifies_by_keywords_without_envelope() {
    let app = TestApp::new();
    let response = app
        .send_json(
            Method::POST,
            "/api/classify",
            json!({
                "description": "Urgent: water leaking from the ceiling pipe",
                "location": { "latitude": 37.87, "longitude": -122.25 }
            }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json.get("data").is_none(), "classification is returned bare");
    assert_eq!(json["category"], "plumbing");
    assert_eq!(json["severity"], "high");
    assert_eq!(json["confidence"], 0.8);
    assert_eq!(
        json["suggestion"],
        "Issue categorized as plumbing with high priority"
    );
}

#[tokio::test]
async fn unmatched_description_is_other_medium() {
    let app = TestApp::new();
    let response = app
        .send_json(
            Method::POST,
            "/api/classify",
            json!({ "description": "Something odd near the quad", "location": null }),
            None,
        )
        .await;

    let json = body_json(response).await;
    assert_eq!(json["category"], "other");
    assert_eq!(json["severity"], "medium");
}

#[tokio::test]
async fn empty_description_is_rejected() {
    let app = TestApp::new();
    let response = app
        .send_json(
            Method::POST,
            "/api/classify",
            json!({ "description": "   ", "location": null }),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "No description provided");
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::matching::repository::{RideRepository, UserRepository};
use crate::matching::router::{match_router, CALLER_HEADER};
use crate::matching::service::MatchService;

fn router_with<R, U>(service: MatchService<R, U>) -> Router
where
    R: RideRepository + 'static,
    U: UserRepository + 'static,
{
    match_router(Arc::new(service))
}

fn match_request(caller: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/matches")
        .header("content-type", "application/json");
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller);
    }
    builder.body(Body::from(body)).expect("request")
}

async fn post(router: Router, caller: Option<&str>, payload: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(match_request(caller, payload.to_string()))
        .await
        .expect("router responds");
    let status = response.status();
    (status, read_json_body(response).await)
}

#[tokio::test]
async fn missing_caller_is_unauthorized() {
    let (service, _) = build_service(vec![candidate("c-1")], None);

    let (status, body) = post(router_with(service), None, json!({ "rideId": RIDE })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "caller identity required");
}

#[tokio::test]
async fn malformed_ride_ids_are_bad_requests() {
    let (service, users) = build_service(vec![candidate("c-1")], None);

    let (status, body) = post(
        router_with(service),
        Some(HOST),
        json!({ "rideId": "../rides", "useAI": false }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .starts_with("invalid match request"));
    assert_eq!(users.lookups(), 0);
}

#[tokio::test]
async fn non_boolean_use_ai_flags_are_bad_requests() {
    let (service, users) = build_service(vec![candidate("c-1")], None);

    let (status, body) = post(
        router_with(service),
        Some(HOST),
        json!({ "rideId": RIDE, "useAI": "yes" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().expect("error message");
    assert!(message.starts_with("invalid match request"));
    assert!(message.contains("useAI"));
    assert_eq!(users.lookups(), 0);
}

#[tokio::test]
async fn unparseable_bodies_are_bad_requests() {
    let (service, _) = build_service(vec![candidate("c-1")], None);

    let response = router_with(service)
        .oneshot(match_request(Some(HOST), "{\"rideId\":".to_string()))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_host_callers_are_forbidden() {
    let (service, _) = build_service(vec![candidate("c-1")], None);

    let (status, _) = post(router_with(service), Some("c-1"), json!({ "rideId": RIDE })).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_rides_are_not_found() {
    let (service, _) = build_service(vec![candidate("c-1")], None);

    let (status, body) = post(
        router_with(service),
        Some(HOST),
        json!({ "rideId": "ride-gone" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ride ride-gone not found");
}

#[tokio::test]
async fn store_failures_hide_their_details() {
    let service = MatchService::new(
        Arc::new(UnavailableRides),
        Arc::new(MemoryUsers::default()),
        None,
    );

    let (status, body) = post(router_with(service), Some(HOST), json!({ "rideId": RIDE })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "match engine failure" }));
}

#[tokio::test]
async fn rule_mode_returns_single_scores() {
    let (service, _) = build_service(vec![rated_candidate("c-1", 5.0)], None);

    let (status, body) = post(
        router_with(service),
        Some(HOST),
        json!({ "rideId": RIDE, "useAI": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "rule_based");
    assert_eq!(body["matches"][0]["score"], 70);
    assert_eq!(body["matches"][0]["user"]["name"], "Rider c-1");
}

#[tokio::test]
async fn semantic_mode_returns_all_three_scores() {
    let (scorer, _) = scorer(ScriptedEmbeddings::new().vector_for("Rider c-1", vec![1.0, 0.0]));
    let (service, _) = build_service(vec![rated_candidate("c-1", 5.0)], Some(scorer));

    let (status, body) = post(
        router_with(service),
        Some(HOST),
        json!({ "rideId": RIDE, "useAI": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "semantic");
    let entry = &body["matches"][0];
    assert_eq!(entry["ruleScore"], 70);
    assert_eq!(entry["aiScore"], 100);
    assert_eq!(entry["finalScore"], 82);
    assert!(entry.get("score").is_none());
}

#[tokio::test]
async fn failed_semantic_pass_still_answers_ok() {
    let (scorer, _) = scorer(ScriptedEmbeddings::new().failing_on_call(2));
    let (service, _) = build_service(vec![candidate("c-1"), candidate("c-2")], Some(scorer));

    let (status, body) = post(
        router_with(service),
        Some(HOST),
        json!({ "rideId": RIDE, "useAI": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "rule_based_fallback");
    assert_eq!(body["matches"].as_array().map(Vec::len), Some(2));
    assert!(body["matches"][0].get("aiScore").is_none());
}

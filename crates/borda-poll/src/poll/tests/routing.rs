use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use std::sync::Arc;

use crate::poll::router::{poll_router, results_handler};
use crate::poll::service::PollService;
use crate::poll::store::BallotStore;

fn vote_request(body: Body) -> Request<Body> {
    Request::post("/vote")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .expect("request builds")
}

#[tokio::test]
async fn vote_route_accepts_a_full_ranking() {
    let (service, store) = build_service();
    let router = poll_router(service);

    let response = router
        .oneshot(vote_request(json_body(
            &json!({ "order": ["E", "D", "C", "B", "A"] }),
        )))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(response).await, json!({ "ok": true }));
    assert_eq!(store.all().expect("reads").len(), 1);
}

#[tokio::test]
async fn vote_route_rejects_partial_ranking() {
    let (service, store) = build_service();
    let router = poll_router(service);

    let response = router
        .oneshot(vote_request(json_body(&json!({ "order": ["A", "B"] }))))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert!(body["msg"]
        .as_str()
        .expect("message present")
        .contains("invalid ranking"));
    assert!(store.all().expect("reads").is_empty());
}

#[tokio::test]
async fn vote_route_treats_malformed_json_as_invalid_ranking() {
    let (service, store) = build_service();
    let router = poll_router(service);

    let response = router
        .oneshot(
            Request::post("/vote")
                .body(Body::from("order=A,B,C,D,E"))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["ok"], false);
    assert!(store.all().expect("reads").is_empty());
}

#[tokio::test]
async fn single_vote_cookie_is_set_and_enforced_when_enabled() {
    let (service, store) = build_service_with(poll_config().with_single_vote(true));
    let router = poll_router(service);

    let first = router
        .clone()
        .oneshot(vote_request(json_body(
            &json!({ "order": ["A", "B", "C", "D", "E"] }),
        )))
        .await
        .expect("router responds");
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = first
        .headers()
        .get(header::SET_COOKIE)
        .expect("voted cookie set")
        .to_str()
        .expect("ascii cookie")
        .to_string();
    assert!(cookie.starts_with("borda_poll_voted=1;"));
    assert!(cookie.contains("SameSite=Lax"));

    let second = router
        .oneshot(
            Request::post("/vote")
                .header(header::COOKIE, "borda_poll_voted=1")
                .body(json_body(&json!({ "order": ["A", "B", "C", "D", "E"] })))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await["ok"], false);
    assert_eq!(store.all().expect("reads").len(), 1);
}

#[tokio::test]
async fn disabled_single_vote_ignores_the_cookie() {
    let (service, store) = build_service();
    let router = poll_router(service);

    let response = router
        .oneshot(
            Request::post("/vote")
                .header(header::COOKIE, "borda_poll_voted=1")
                .body(json_body(&json!({ "order": ["A", "B", "C", "D", "E"] })))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.all().expect("reads").len(), 1);
}

#[tokio::test]
async fn results_route_reports_empty_poll() {
    let (service, _) = build_service();
    let router = poll_router(service);

    let response = router
        .oneshot(
            Request::get("/results")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_votes"], 0);
    assert!(body["winner"].is_null());
    assert_eq!(body["ranking"], json!([]));
    assert_eq!(body["scores"]["C"], 0);
}

#[tokio::test]
async fn results_handler_returns_internal_error_when_store_is_offline() {
    let response = match results_handler(State(offline_service())).await {
        Ok(_) => panic!("offline store should fail"),
        Err(err) => axum::response::IntoResponse::into_response(err),
    };
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn ballot_route_lists_candidates_and_weights() {
    let (service, _) = build_service();
    let router = poll_router(service);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).expect("request builds"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["candidates"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["candidates"][0]["name"], "A");
    assert_eq!(body["weights"], json!([5, 4, 3, 2, 1]));
    assert_eq!(body["single_vote"], false);
}

#[tokio::test]
async fn export_route_downloads_csv() {
    let (service, _) = build_service();
    service
        .submit(order(&["A", "B", "C", "D", "E"]))
        .expect("valid");
    service
        .submit(order(&["E", "D", "C", "B", "A"]))
        .expect("valid");
    let router = poll_router(service);

    let response = router
        .oneshot(
            Request::get("/export.csv")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .expect("content type");
    assert!(content_type.starts_with("text/csv"));
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .expect("disposition");
    assert_eq!(disposition, "attachment; filename=\"votes_export.csv\"");

    let body = String::from_utf8(body_bytes(response).await).expect("utf-8");
    let rows: Vec<&str> = body.split_terminator("\r\n").collect();
    assert_eq!(
        rows,
        ["rank1,rank2,rank3,rank4,rank5", "A,B,C,D,E", "E,D,C,B,A"]
    );
}

#[tokio::test]
async fn reset_with_wrong_token_is_forbidden() {
    let (service, store) = build_service();
    service
        .submit(order(&["A", "B", "C", "D", "E"]))
        .expect("valid");
    let router = poll_router(service);

    for uri in ["/reset?token=nope", "/reset"] {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    assert_eq!(store.all().expect("reads").len(), 1);
}

#[tokio::test]
async fn reset_with_token_clears_and_redirects_to_results() {
    let (service, store) = build_service();
    service
        .submit(order(&["A", "B", "C", "D", "E"]))
        .expect("valid");
    let router = poll_router(service);

    let response = router
        .oneshot(
            Request::get(format!("/reset?token={TOKEN}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert!(response.status().is_redirection());
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/results")
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("cookie expired");
    assert!(cookie.contains("Max-Age=0"));
    assert!(store.all().expect("reads").is_empty());
}

#[tokio::test]
async fn store_work_runs_off_the_request_thread() {
    let store = Arc::new(ThreadTrackingStore::default());
    let service = Arc::new(PollService::new(Arc::new(poll_config()), store.clone()));
    let router = poll_router(service);

    let response = router
        .clone()
        .oneshot(vote_request(json_body(
            &json!({ "order": ["A", "B", "C", "D", "E"] }),
        )))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::get("/results")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total_votes"], 1);

    let request_thread = std::thread::current().id();
    let threads = store.threads();
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|id| *id != request_thread));
}

#[tokio::test]
async fn crashed_store_call_becomes_internal_error() {
    let service = Arc::new(PollService::new(
        Arc::new(poll_config()),
        Arc::new(PanickingStore),
    ));
    let router = poll_router(service);

    let response = router
        .clone()
        .oneshot(vote_request(json_body(
            &json!({ "order": ["A", "B", "C", "D", "E"] }),
        )))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["ok"], false);

    let response = router
        .oneshot(
            Request::get("/export.csv")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

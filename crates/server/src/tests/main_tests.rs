use super::*;
use axum::{body, body::Body, http::Request};
use tower::ServiceExt;

async fn test_app() -> Router {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    build_router(
        Arc::new(AppState {
            api: ApiContext { storage },
        }),
        "/api/v1",
    )
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

async fn post_event(app: &Router, body: serde_json::Value) -> axum::response::Response {
    let request = Request::post("/api/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let app = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn create_then_list_returns_envelope() {
    let app = test_app().await;
    let response = post_event(
        &app,
        serde_json::json!({ "title": "Standup", "date": "2024-01-01", "time": "09:00" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Event = read_json(response).await;
    assert_eq!(created.category, shared::domain::Category::Work);

    let request = Request::get("/api/v1/events")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let raw: serde_json::Value = read_json(response).await;
    assert_eq!(raw["meta"]["total"], 1);
    assert_eq!(raw["result"][0]["id"], created.id.as_str());
    assert_eq!(raw["result"][0]["archived"], false);
}

#[tokio::test]
async fn invalid_create_body_is_bad_request() {
    let app = test_app().await;
    let response = post_event(
        &app,
        serde_json::json!({ "title": "", "date": "2024-01-01", "time": "09:00" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let err: ApiError = read_json(response).await;
    assert!(matches!(err.code, ErrorCode::Validation));
    assert_eq!(err.fields[0].message, "Title is required");
}

#[tokio::test]
async fn patch_put_and_delete_follow_contract() {
    let app = test_app().await;
    let created: Event = read_json(
        post_event(
            &app,
            serde_json::json!({ "title": "Dinner", "date": "2024-01-01", "time": "19:00" }),
        )
        .await,
    )
    .await;
    let path = format!("/api/v1/events/{}", created.id);

    let patch = Request::patch(path.as_str())
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "time": "20:00" }).to_string()))
        .expect("request");
    let response = app.clone().oneshot(patch).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let patched: Event = read_json(response).await;
    assert_eq!(patched.time, "20:00");
    assert_eq!(patched.title, "Dinner");

    let put = Request::put(path.as_str())
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(put).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let archived: Event = read_json(response).await;
    assert!(archived.archived);

    let delete = Request::delete(path.as_str())
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(delete).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let get = Request::get(path.as_str())
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(get).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_id_is_not_found_for_every_verb() {
    let app = test_app().await;
    for method in ["PUT", "DELETE"] {
        let request = Request::builder()
            .method(method)
            .uri("/api/v1/events/missing")
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
    }

    let patch = Request::patch("/api/v1/events/missing")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .expect("request");
    let response = app.oneshot(patch).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn error_codes_map_to_statuses() {
    assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(ErrorCode::Validation), StatusCode::BAD_REQUEST);
    assert_eq!(
        status_for(ErrorCode::Internal),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_token};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn channel_body(team_id: i64, channel_id: i64, scheduled: bool) -> Value {
    json!({
        "teamId": team_id,
        "channelId": channel_id,
        "channelType": "farm",
        "saleableType": "oysters",
        "cropType": "pacific",
        "metadata": json!({"importReports": {"notifier": false, "scheduled": scheduled}})
            .to_string()
    })
}

async fn add(app: &Router, team_id: i64, channel_id: i64, scheduled: bool) {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/channels", channel_body(team_id, channel_id, scheduled)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- channels ---

#[tokio::test]
async fn add_then_get_channel() {
    let app = app();
    add(&app, 1, 42, false).await;

    let resp = app.oneshot(get("/channels/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["channelId"], 42);
    assert_eq!(body["data"]["cropType"], "pacific");
    assert_eq!(body["data"]["reports"], json!({"notifier": false, "scheduled": false}));
}

#[tokio::test]
async fn duplicate_channel_is_rejected() {
    let app = app();
    add(&app, 1, 42, false).await;

    let resp = app
        .oneshot(json_request("POST", "/channels", channel_body(1, 42, false)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "channel already exists"}));
}

#[tokio::test]
async fn unknown_channel_is_404_with_error() {
    let resp = app().oneshot(get("/channels/7")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "channel not found");
}

#[tokio::test]
async fn malformed_metadata_is_400() {
    let mut body = channel_body(1, 2, false);
    body["metadata"] = json!("{not json");
    let resp = app()
        .oneshot(json_request("POST", "/channels", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "metadata must be a JSON document");
}

#[tokio::test]
async fn queue_returns_task() {
    let resp = app()
        .oneshot(json_request("POST", "/channels/queue", channel_body(1, 5, false)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["status"], "queued");
    assert_eq!(body["data"]["channelId"], 5);
}

#[tokio::test]
async fn scheduled_filters_by_team() {
    let app = app();
    add(&app, 1, 10, true).await;
    add(&app, 2, 20, true).await;
    add(&app, 1, 30, false).await;

    let resp = app.clone().oneshot(get("/channels/scheduled")).await.unwrap();
    let ids: Vec<i64> = body_json(resp).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["channelId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![10, 20]);

    let resp = app.oneshot(get("/channels/scheduled?teamId=2")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["channelId"], 20);
}

#[tokio::test]
async fn manage_hides_deleted_channel_from_team() {
    let app = app();
    add(&app, 3, 1, false).await;
    add(&app, 3, 2, false).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/channels/1/manage",
            json!({"isDeleted": true, "isArchived": false}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["isDeleted"], true);

    let resp = app.oneshot(get("/channels/team/3")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["channelId"], 2);
}

#[tokio::test]
async fn import_replaces_reports() {
    let app = app();
    add(&app, 1, 4, false).await;
    let resp = app
        .oneshot(json_request(
            "PUT",
            "/channels/4/import",
            json!({"reports": {"notifier": true, "scheduled": true}}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await["data"]["reports"],
        json!({"notifier": true, "scheduled": true})
    );
}

// --- sync ---

#[tokio::test]
async fn webhook_lifecycle_ends_gone() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/sync/webhooks",
            json!({"type": "report", "endpoint": "https://x"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let id = body_json(resp).await["data"]["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/sync/webhooks/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get(&format!("/sync/webhooks/{id}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::GONE);
    assert_eq!(body_json(resp).await["error"], "webhook was removed");
}

#[tokio::test]
async fn ingest_requires_model() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/sync/ingest",
            json!({"model": "", "data": []}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ingest_counts_records() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/sync/ingest",
            json!({"model": "harvest", "data": [1, 2, 3]}),
        ))
        .await
        .unwrap();
    assert_eq!(
        body_json(resp).await["data"],
        json!({"model": "harvest", "received": 3, "total": 3})
    );
}

// --- rejections ---

#[tokio::test]
async fn malformed_json_body_is_400_with_error() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sync/ingest")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("{not json".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn missing_content_type_is_400_with_error() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sync/webhooks")
                .body(json!({"type": "report", "endpoint": "https://x"}).to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn non_numeric_channel_id_is_400_with_error() {
    let resp = app().oneshot(get("/channels/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn non_numeric_team_filter_is_400_with_error() {
    let resp = app().oneshot(get("/channels/scheduled?teamId=abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn unknown_route_is_404_with_error() {
    let resp = app().oneshot(get("/missing/route")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({"error": "route not found"}));
}

// --- auth ---

#[tokio::test]
async fn wrong_token_is_forbidden() {
    let app = app_with_token(Some("secret".to_string()));
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/sync/webhooks")
                .header(http::header::AUTHORIZATION, "Bearer nope")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await, json!({"error": "invalid token"}));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/sync/webhooks")
                .header(http::header::AUTHORIZATION, "Bearer secret")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"data": []}));
}

#[tokio::test]
async fn missing_token_is_forbidden() {
    let resp = app_with_token(Some("secret".to_string()))
        .oneshot(get("/channels/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(!body_bytes(resp).await.is_empty());
}

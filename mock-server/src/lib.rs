//! In-memory FarmOpsX API used for end-to-end tests of the client.
//!
//! Every success body is `{"data": ...}` and every failure body is
//! `{"error": "..."}`, with the statuses the real API uses: 400 for bad
//! input, 403 for a bad token, 404 for unknown records and 410 for deleted
//! webhooks.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub channel_id: i64,
    pub team_id: i64,
    pub channel_name: String,
    pub channel_type: String,
    pub saleable_type: String,
    pub crop_type: String,
    pub metadata: Value,
    pub reports: Value,
    pub is_deleted: bool,
    pub is_archived: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Webhook {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub endpoint: String,
    pub enabled: bool,
    pub metadata: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub channel_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddChannel {
    team_id: i64,
    channel_id: i64,
    #[serde(default)]
    channel_type: String,
    #[serde(default)]
    saleable_type: String,
    #[serde(default)]
    crop_type: String,
    metadata: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditChannel {
    #[serde(default)]
    channel_name: String,
    #[serde(default)]
    channel_type: String,
    #[serde(default)]
    saleable_type: String,
    #[serde(default)]
    crop_type: String,
    metadata: String,
}

#[derive(Deserialize)]
struct ImportReports {
    reports: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManageChannel {
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    is_archived: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledQuery {
    team_id: Option<i64>,
}

#[derive(Deserialize)]
struct Ingest {
    model: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct NewWebhook {
    #[serde(rename = "type")]
    kind: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct SyncWebhook {
    #[serde(rename = "type")]
    kind: String,
    endpoint: String,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    metadata: Value,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Default)]
struct Store {
    channels: HashMap<i64, Channel>,
    tasks: Vec<Task>,
    webhooks: HashMap<String, Webhook>,
    removed_webhooks: HashSet<String>,
    ingested: HashMap<String, usize>,
    reports: Vec<Value>,
}

#[derive(Clone)]
struct AppState {
    db: Arc<RwLock<Store>>,
    token: Option<Arc<str>>,
}

/// `{"error": message}` with the given status.
struct ApiFailure(StatusCode, String);

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, message.into())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiFailure>;

/// JSON request body whose rejections are reported as `ApiFailure`.
struct JsonBody(Value);

impl<S: Send + Sync> FromRequest<S> for JsonBody {
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiFailure::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path parameters whose rejections are reported as `ApiFailure`.
struct PathParam<T>(T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiFailure::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string whose rejections are reported as `ApiFailure`.
struct QueryParams<T>(T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiFailure::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

fn data(value: impl Serialize) -> ApiResult {
    Ok(Json(json!({ "data": value })))
}

/// Decode a JSON body, reporting shape errors as 400 with a JSON error.
fn parse<T: DeserializeOwned>(body: Value) -> Result<T, ApiFailure> {
    serde_json::from_value(body).map_err(|e| ApiFailure::bad_request(e.to_string()))
}

fn parse_metadata(raw: &str) -> Result<Value, ApiFailure> {
    serde_json::from_str(raw)
        .map_err(|_| ApiFailure::bad_request("metadata must be a JSON document"))
}

fn schedule_from(metadata: &Value) -> Value {
    metadata
        .get("importReports")
        .cloned()
        .unwrap_or_else(|| json!({ "notifier": false, "scheduled": false }))
}

/// Router without a token check.
pub fn app() -> Router {
    app_with_token(None)
}

/// Router that rejects requests whose bearer token differs from `token`.
pub fn app_with_token(token: Option<String>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        token: token.map(Arc::from),
    };
    Router::new()
        .route("/channels", post(add_channel))
        .route("/channels/queue", post(queue_channel))
        .route("/channels/scheduled", get(scheduled_channels))
        .route("/channels/team/{team_id}", get(team_channels))
        .route("/channels/{channel_id}", get(get_channel).put(edit_channel))
        .route("/channels/{channel_id}/import", put(import_channel))
        .route("/channels/{channel_id}/manage", put(manage_channel))
        .route("/sync/external/saferme/report", post(external_report))
        .route("/sync/ingest", post(ingest))
        .route("/sync/webhooks", get(list_webhooks).post(create_webhook))
        .route(
            "/sync/webhooks/{id}",
            get(get_webhook).put(sync_webhook).delete(delete_webhook),
        )
        .fallback(unknown_route)
        .layer(middleware::from_fn_with_state(state.clone(), authorize))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    tracing::info!(method = %request.method(), path = %request.uri().path(), "request");
    if let Some(token) = &state.token {
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if presented != Some(token.as_ref()) {
            return ApiFailure(StatusCode::FORBIDDEN, "invalid token".to_string()).into_response();
        }
    }
    next.run(request).await
}

async fn unknown_route() -> ApiFailure {
    ApiFailure::not_found("route not found")
}

fn build_channel(input: AddChannel) -> Result<Channel, ApiFailure> {
    let metadata = parse_metadata(&input.metadata)?;
    Ok(Channel {
        channel_id: input.channel_id,
        team_id: input.team_id,
        channel_name: String::new(),
        channel_type: input.channel_type,
        saleable_type: input.saleable_type,
        crop_type: input.crop_type,
        reports: schedule_from(&metadata),
        metadata,
        is_deleted: false,
        is_archived: false,
    })
}

async fn add_channel(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let channel = build_channel(parse(body)?)?;
    let mut db = state.db.write().await;
    if db.channels.contains_key(&channel.channel_id) {
        return Err(ApiFailure::bad_request("channel already exists"));
    }
    db.channels.insert(channel.channel_id, channel.clone());
    data(channel)
}

async fn queue_channel(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let channel = build_channel(parse(body)?)?;
    let task = Task {
        id: Uuid::new_v4(),
        kind: "channel.add".to_string(),
        status: "queued".to_string(),
        channel_id: channel.channel_id,
    };
    let mut db = state.db.write().await;
    db.channels.entry(channel.channel_id).or_insert(channel);
    db.tasks.push(task.clone());
    data(task)
}

async fn get_channel(
    State(state): State<AppState>,
    PathParam(channel_id): PathParam<i64>,
) -> ApiResult {
    let db = state.db.read().await;
    let channel = db
        .channels
        .get(&channel_id)
        .ok_or_else(|| ApiFailure::not_found("channel not found"))?;
    data(channel)
}

async fn edit_channel(
    State(state): State<AppState>,
    PathParam(channel_id): PathParam<i64>,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let input: EditChannel = parse(body)?;
    let metadata = parse_metadata(&input.metadata)?;
    let mut db = state.db.write().await;
    let channel = db
        .channels
        .get_mut(&channel_id)
        .ok_or_else(|| ApiFailure::not_found("channel not found"))?;
    channel.channel_name = input.channel_name;
    channel.channel_type = input.channel_type;
    channel.saleable_type = input.saleable_type;
    channel.crop_type = input.crop_type;
    channel.reports = schedule_from(&metadata);
    channel.metadata = metadata;
    data(channel.clone())
}

async fn import_channel(
    State(state): State<AppState>,
    PathParam(channel_id): PathParam<i64>,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let input: ImportReports = parse(body)?;
    let mut db = state.db.write().await;
    let channel = db
        .channels
        .get_mut(&channel_id)
        .ok_or_else(|| ApiFailure::not_found("channel not found"))?;
    channel.reports = input.reports;
    data(channel.clone())
}

async fn manage_channel(
    State(state): State<AppState>,
    PathParam(channel_id): PathParam<i64>,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let input: ManageChannel = parse(body)?;
    let mut db = state.db.write().await;
    let channel = db
        .channels
        .get_mut(&channel_id)
        .ok_or_else(|| ApiFailure::not_found("channel not found"))?;
    channel.is_deleted = input.is_deleted;
    channel.is_archived = input.is_archived;
    data(channel.clone())
}

async fn scheduled_channels(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ScheduledQuery>,
) -> ApiResult {
    let db = state.db.read().await;
    let mut channels: Vec<&Channel> = db
        .channels
        .values()
        .filter(|c| c.reports.get("scheduled") == Some(&Value::Bool(true)))
        .filter(|c| query.team_id.map_or(true, |team| c.team_id == team))
        .collect();
    channels.sort_by_key(|c| c.channel_id);
    data(channels)
}

async fn team_channels(
    State(state): State<AppState>,
    PathParam(team_id): PathParam<i64>,
) -> ApiResult {
    let db = state.db.read().await;
    let mut channels: Vec<&Channel> = db
        .channels
        .values()
        .filter(|c| c.team_id == team_id && !c.is_deleted)
        .collect();
    channels.sort_by_key(|c| c.channel_id);
    data(channels)
}

async fn external_report(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let report = body
        .get("data")
        .filter(|d| !d.is_null())
        .cloned()
        .ok_or_else(|| ApiFailure::bad_request("data is required"))?;
    let mut db = state.db.write().await;
    db.reports.push(report);
    data(json!({ "accepted": db.reports.len() }))
}

async fn ingest(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let input: Ingest = parse(body)?;
    if input.model.is_empty() {
        return Err(ApiFailure::bad_request("model is required"));
    }
    let records = match &input.data {
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    };
    let mut db = state.db.write().await;
    let total = db.ingested.entry(input.model.clone()).or_insert(0);
    *total += records;
    data(json!({ "model": input.model, "received": records, "total": *total }))
}

async fn list_webhooks(State(state): State<AppState>) -> ApiResult {
    let db = state.db.read().await;
    let mut hooks: Vec<&Webhook> = db.webhooks.values().collect();
    hooks.sort_by(|a, b| a.id.cmp(&b.id));
    data(hooks)
}

async fn create_webhook(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult {
    let input: NewWebhook = parse(body)?;
    let hook = Webhook {
        id: Uuid::new_v4().to_string(),
        kind: input.kind,
        endpoint: input.endpoint,
        enabled: true,
        metadata: json!({}),
    };
    state
        .db
        .write()
        .await
        .webhooks
        .insert(hook.id.clone(), hook.clone());
    data(hook)
}

fn missing_webhook(db: &Store, id: &str) -> ApiFailure {
    if db.removed_webhooks.contains(id) {
        ApiFailure(StatusCode::GONE, "webhook was removed".to_string())
    } else {
        ApiFailure::not_found("webhook not found")
    }
}

async fn get_webhook(State(state): State<AppState>, PathParam(id): PathParam<String>) -> ApiResult {
    let db = state.db.read().await;
    match db.webhooks.get(&id) {
        Some(hook) => data(hook),
        None => Err(missing_webhook(&db, &id)),
    }
}

async fn sync_webhook(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    JsonBody(body): JsonBody,
) -> ApiResult {
    let input: SyncWebhook = parse(body)?;
    let mut db = state.db.write().await;
    if !db.webhooks.contains_key(&id) {
        return Err(missing_webhook(&db, &id));
    }
    let hook = Webhook {
        id: id.clone(),
        kind: input.kind,
        endpoint: input.endpoint,
        enabled: input.enabled,
        metadata: input.metadata,
    };
    db.webhooks.insert(id, hook.clone());
    data(hook)
}

async fn delete_webhook(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> ApiResult {
    let mut db = state.db.write().await;
    match db.webhooks.remove(&id) {
        Some(hook) => {
            db.removed_webhooks.insert(id);
            data(hook)
        }
        None => Err(missing_webhook(&db, &id)),
    }
}

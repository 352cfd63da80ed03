//! In-process stub of the complaint API used by the async tests.
//!
//! The stub binds to an ephemeral loopback port, answers the endpoints the
//! client uses, and records every request it sees (path, bearer header,
//! query, and a JSON rendering of the body).

use axum::extract::{Form, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::http::ApiClient;
use crate::session::Session;
use crate::storage::{MemoryTokenStore, TokenStore};

pub const VALID_TOKEN: &str = "token-123";
/// Token of an ADMIN account; accepted everywhere `VALID_TOKEN` is.
pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "secret";
/// Logging in as this account succeeds but returns no token.
pub const TOKENLESS_EMAIL: &str = "tokenless@example.com";
/// Registering with this email fails with 400.
pub const TAKEN_EMAIL: &str = "taken@example.com";
/// How long `/slow` takes to answer.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub query: HashMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    #[default]
    Normal,
    /// 500 with a `detail` body
    ServerError,
    /// 200 with a body that is not JSON
    Malformed,
}

#[derive(Default)]
struct StubState {
    requests: Vec<RecordedRequest>,
    listing_mode: ListingMode,
    first_page_delay: Option<Duration>,
}

type Shared = Arc<Mutex<StubState>>;

pub struct StubServer {
    base_url: String,
    state: Shared,
}

impl StubServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(StubState::default()));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/user", get(current_user))
            .route("/auth/register", post(register))
            .route("/complaints", get(list_complaints).post(create_complaint))
            .route("/complaints/:id", get(get_complaint).put(update_complaint))
            .route("/dashboard/", get(dashboard))
            .route("/garbage", get(|| async { "definitely not json" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(SLOW_RESPONSE).await;
                    "late"
                }),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 10,
        }
    }

    /// Client plus its session, backed by an in-memory token store.
    pub fn client(&self) -> (ApiClient, Arc<Session>) {
        self.client_with_store(Arc::new(MemoryTokenStore::new()))
    }

    pub fn client_with_store(&self, store: Arc<dyn TokenStore>) -> (ApiClient, Arc<Session>) {
        let session = Arc::new(Session::new(store));
        let client = ApiClient::new(&self.api_config(), session.clone()).expect("client");
        (client, session)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn last_request(&self, path: &str) -> Option<RecordedRequest> {
        self.requests_to(path).pop()
    }

    pub fn set_listing_mode(&self, mode: ListingMode) {
        self.state.lock().listing_mode = mode;
    }

    pub fn delay_first_page(&self, delay: Duration) {
        self.state.lock().first_page_delay = Some(delay);
    }
}

fn user_json() -> Value {
    json!({
        "id": "u1",
        "email": USER_EMAIL,
        "name": "Test User",
        "role": "CITIZEN",
        "dob": "1990-05-03",
        "createdAt": "2024-01-01T09:00:00"
    })
}

fn complaint_json(id: &str, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u1",
        "title": title,
        "description": format!("{} description", title),
        "status": status,
        "images": [],
        "createdAt": "2024-01-01T09:00:00",
        "updatedAt": "2024-01-02T09:00:00"
    })
}

fn all_complaints() -> Vec<Value> {
    vec![
        complaint_json("c1", "Pothole on Main St", "OPEN"),
        complaint_json("c2", "Broken streetlight", "IN_PROGRESS"),
        complaint_json("c3", "Overflowing bin", "RESOLVED"),
        complaint_json("c4", "Noisy construction", "CLOSED"),
    ]
}

fn record(
    state: &Shared,
    method: &str,
    path: String,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: Value,
) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.lock().requests.push(RecordedRequest {
        method: method.to_string(),
        path,
        authorization: header("authorization"),
        content_type: header("content-type"),
        query,
        body,
    });
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn is_authorized(headers: &HeaderMap) -> bool {
    matches!(bearer(headers), Some(VALID_TOKEN) | Some(ADMIN_TOKEN))
}

async fn login(
    State(state): State<Shared>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    record(&state, "POST", "/auth/login".into(), &headers, HashMap::new(), json!(form));

    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);
    match (username, password) {
        (Some(USER_EMAIL), Some(USER_PASSWORD)) => {
            Json(json!({ "access_token": VALID_TOKEN, "token_type": "bearer" })).into_response()
        }
        (Some(TOKENLESS_EMAIL), Some(USER_PASSWORD)) => {
            Json(json!({ "token_type": "bearer" })).into_response()
        }
        _ => detail(StatusCode::UNAUTHORIZED, "Incorrect email or password"),
    }
}

async fn current_user(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/auth/user".into(), &headers, HashMap::new(), Value::Null);

    if is_authorized(&headers) {
        Json(user_json()).into_response()
    } else {
        detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
    }
}

async fn register(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "POST", "/auth/register".into(), &headers, HashMap::new(), body.clone());

    if body["email"] == TAKEN_EMAIL {
        return detail(StatusCode::BAD_REQUEST, "Email already registered");
    }

    let mut user = body;
    if let Some(fields) = user.as_object_mut() {
        fields.remove("password");
        fields.insert("id".into(), json!("u2"));
    }
    Json(user).into_response()
}

async fn list_complaints(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record(&state, "GET", "/complaints".into(), &headers, query.clone(), Value::Null);

    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }

    let (mode, first_page_delay) = {
        let guard = state.lock();
        (guard.listing_mode, guard.first_page_delay)
    };
    match mode {
        ListingMode::ServerError => {
            return detail(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable")
        }
        ListingMode::Malformed => return "<html>oops</html>".into_response(),
        ListingMode::Normal => {}
    }

    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);

    if let Some(status) = query.get("status") {
        let matching: Vec<Value> = all_complaints()
            .into_iter()
            .filter(|c| c["status"] == status.as_str())
            .collect();
        return Json(json!({
            "complaints": matching,
            "pagination": { "page": 1, "total_pages": 1, "total_count": matching.len() }
        }))
        .into_response();
    }

    if let (Some(limit), None) = (query.get("limit"), query.get("page")) {
        let limit: usize = limit.parse().unwrap_or(10);
        let recent: Vec<Value> = all_complaints().into_iter().take(limit).collect();
        return Json(json!({ "complaints": recent })).into_response();
    }

    let complaints: Vec<Value> = match page {
        1 => {
            if let Some(delay) = first_page_delay {
                tokio::time::sleep(delay).await;
            }
            all_complaints().into_iter().take(3).collect()
        }
        2 => all_complaints().into_iter().skip(3).collect(),
        _ => Vec::new(),
    };

    Json(json!({
        "complaints": complaints,
        "pagination": {
            "page": page,
            "limit": 3,
            "total_count": 4,
            "total_pages": 2,
            "has_next": page < 2,
            "has_prev": page > 1
        }
    }))
    .into_response()
}

async fn get_complaint(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    record(&state, "GET", format!("/complaints/{}", id), &headers, HashMap::new(), Value::Null);

    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }

    match all_complaints().into_iter().find(|c| c["id"] == id.as_str()) {
        Some(complaint) => Json(complaint).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Complaint not found"),
    }
}

/// Multipart body as `{"fields": {name: [values]}, "files": [{field, file_name, content_type, size}]}`.
async fn read_multipart(mut multipart: Multipart) -> Value {
    let mut fields: HashMap<String, Vec<String>> = HashMap::new();
    let mut files = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        match file_name {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                files.push(json!({
                    "field": name,
                    "file_name": file_name,
                    "content_type": content_type,
                    "size": size
                }));
            }
            None => {
                let value = field.text().await.unwrap_or_default();
                fields.entry(name).or_default().push(value);
            }
        }
    }

    json!({ "fields": fields, "files": files })
}

async fn create_complaint(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let body = read_multipart(multipart).await;
    record(&state, "POST", "/complaints".into(), &headers, HashMap::new(), body.clone());

    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }

    let title = body["fields"]["title"][0].as_str().unwrap_or_default().to_string();
    if title == "fail" {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Title rejected");
    }

    let mut complaint = complaint_json("c9", &title, "OPEN");
    complaint["description"] = body["fields"]["description"][0].clone();
    let images: Vec<String> = body["files"]
        .as_array()
        .map(|files| {
            files
                .iter()
                .map(|f| {
                    format!(
                        "uploads/complaints/{}",
                        f["file_name"].as_str().unwrap_or_default()
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    complaint["images"] = json!(images);

    Json(json!({ "message": "Complaint created successfully", "complaint": complaint }))
        .into_response()
}

async fn update_complaint(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let body = read_multipart(multipart).await;
    record(&state, "PUT", format!("/complaints/{}", id), &headers, HashMap::new(), body.clone());

    if !is_authorized(&headers) {
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
    }

    let Some(mut complaint) = all_complaints().into_iter().find(|c| c["id"] == id.as_str()) else {
        return detail(StatusCode::NOT_FOUND, "Complaint not found");
    };

    if let Some(title) = body["fields"]["title"][0].as_str() {
        complaint["title"] = json!(title);
    }
    if body["fields"]["action"][0] == "START" {
        complaint["status"] = json!("IN_PROGRESS");
    }

    Json(json!({ "message": "Complaint updated successfully", "data": complaint })).into_response()
}

async fn dashboard(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/dashboard/".into(), &headers, HashMap::new(), Value::Null);

    match bearer(&headers) {
        Some(ADMIN_TOKEN) => {}
        Some(VALID_TOKEN) => return detail(StatusCode::FORBIDDEN, "Admins only"),
        _ => return detail(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }

    Json(json!({
        "totalComplaints": 4,
        "statusCounts": {"OPEN": 1, "IN_PROGRESS": 1, "RESOLVED": 1, "CLOSED": 1, "REJECTED": 0},
        "last24hComplaints": 0,
        "recentComplaints": all_complaints(),
        "complaintsPerDay7": [],
        "complaintsPerDay30": [{"_id": "2024-01-01", "count": 4}],
        "topUsers": [{"count": 4, "user_id": "u1"}],
        "completionRate": 50.0,
        "agingBuckets": {"<24h": 0, "1-3d": 0, "3-7d": 0, ">7d": 4},
        "longestOpenComplaints": [{"id": "c1", "title": "Pothole on Main St", "createdAt": "2024-01-01T09:00:00"}],
        "adminEfficiencyScore": 50.0
    }))
    .into_response()
}

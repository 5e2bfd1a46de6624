// system-tests/tests/helpers/flow_stub.rs
// ============================================================================
// Module: Flow API Stub
// Description: In-process stand-in for the Flow REST, GraphQL, and Graph APIs.
// Purpose: Give the phases a deterministic server to run against.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! The stub keeps users, sessions, and third-party links in memory and answers
//! with the same status codes and error codes the real service uses. GraphQL
//! rows are only visible to the bearer that owns them, mirroring row-level
//! permissions. Options tune the policy knobs, can force registration to
//! fail so dependent phases have nothing to read, and can break the
//! idempotency of registration, third-party login, and delete.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Calendar events served by the stub, before the volatile stamp is added.
pub const CALENDAR_EVENTS: &str = "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//flow//stub//EN\n\
                                   BEGIN:VEVENT\nSUMMARY:CS 135 LEC 001\nLOCATION:MC \
                                   2065\nDTSTART:20200106T083000\nDTEND:20200106T092000\n\
                                   END:VEVENT\nEND:VCALENDAR\n";

/// Behaviour knobs for one stub instance.
#[derive(Debug, Clone)]
pub struct StubOptions {
    /// Third-party application id.
    pub app_id: String,
    /// Third-party application secret.
    pub app_secret: String,
    /// Test users listed by the Graph stub.
    pub test_users: usize,
    /// Courses in the data dump.
    pub courses: usize,
    /// Professors in the data dump.
    pub profs: usize,
    /// Sections reported for any schedule upload.
    pub schedule_sections: u64,
    /// Courses reported for any transcript upload.
    pub transcript_courses: u64,
    /// Status of a duplicate registration.
    pub duplicate_status: u16,
    /// Calendar route prefix.
    pub calendar_prefix: String,
    /// Status of a served calendar.
    pub calendar_success_status: u16,
    /// Status for an unknown calendar secret.
    pub calendar_invalid_status: u16,
    /// Fail otherwise valid registrations with a server error.
    pub reject_registration: bool,
    /// Answer a duplicate registration with 200 and a session for the owner.
    pub accept_duplicate_registration: bool,
    /// Create a new user for every third-party login instead of reusing the link.
    pub relink_facebook_logins: bool,
    /// Add an undocumented key to third-party login envelopes.
    pub facebook_extra_key: bool,
    /// Report one affected row for every delete of the caller's id.
    pub delete_always_affects_row: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            app_id: "1234".to_string(),
            app_secret: "stub-secret".to_string(),
            test_users: 8,
            courses: 3,
            profs: 2,
            schedule_sections: 9,
            transcript_courses: 27,
            duplicate_status: 401,
            calendar_prefix: "/calendar".to_string(),
            calendar_success_status: 201,
            calendar_invalid_status: 401,
            reject_registration: false,
            accept_duplicate_registration: false,
            relink_facebook_logins: false,
            facebook_extra_key: false,
            delete_always_affects_row: false,
        }
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Stored user row.
#[derive(Debug, Clone)]
struct StubUser {
    email: Option<String>,
    full_name: String,
    password: Option<String>,
    secret_id: String,
}

/// Mutable server state.
#[derive(Debug)]
struct StubData {
    next_id: i64,
    next_token: u64,
    users: BTreeMap<i64, StubUser>,
    sessions: BTreeMap<String, i64>,
    facebook_links: BTreeMap<String, i64>,
}

impl StubData {
    fn new() -> Self {
        Self {
            next_id: 1000,
            next_token: 1,
            users: BTreeMap::new(),
            sessions: BTreeMap::new(),
            facebook_links: BTreeMap::new(),
        }
    }

    fn create_user(
        &mut self,
        email: Option<&str>,
        full_name: &str,
        password: Option<&str>,
    ) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        let user = StubUser {
            email: email.map(str::to_string),
            full_name: full_name.to_string(),
            password: password.map(str::to_string),
            secret_id: format!("{:012x}", id.unsigned_abs().wrapping_mul(0x9e37_79b9)),
        };
        self.users.insert(id, user);
        id
    }

    fn find_by_email(&self, email: &str) -> Option<i64> {
        self.users
            .iter()
            .find(|(_, user)| user.email.as_deref() == Some(email))
            .map(|(id, _)| *id)
    }

    /// Opens a session and returns the auth envelope for it.
    fn open_session(&mut self, id: i64) -> Value {
        let token = format!("session-{id}-{}", self.next_token);
        self.next_token += 1;
        self.sessions.insert(token.clone(), id);
        let secret_id = self.users.get(&id).map(|user| user.secret_id.clone()).unwrap_or_default();
        json!({
            "token": token,
            "user_id": id,
            "secret_id": secret_id,
        })
    }

    /// Resolves the bearer to a user id; sessions outlive deleted users.
    fn caller(&self, headers: &HeaderMap) -> Option<i64> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer").map(str::trim).filter(|t| !t.is_empty())?;
        self.sessions.get(token).copied()
    }
}

#[derive(Clone)]
struct StubState {
    options: Arc<StubOptions>,
    data: Arc<Mutex<StubData>>,
}

impl StubState {
    fn lock(&self) -> Result<MutexGuard<'_, StubData>, Response> {
        self.data.lock().map_err(|_| error(StatusCode::INTERNAL_SERVER_ERROR, "internal"))
    }

    /// Resolves the caller to an existing user or answers 401.
    fn authorized(&self, headers: &HeaderMap) -> Result<i64, Response> {
        let data = self.lock()?;
        data.caller(headers)
            .filter(|id| data.users.contains_key(id))
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "unauthorized"))
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Handle for the running stub; shuts the server down on drop.
pub struct FlowStubHandle {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    data: Arc<Mutex<StubData>>,
}

impl FlowStubHandle {
    /// Returns the REST base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the GraphQL endpoint.
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    /// Returns the Graph API root.
    pub fn graph_url(&self) -> String {
        format!("{}/graph", self.base_url)
    }

    /// Returns the number of stored users.
    pub fn user_count(&self) -> usize {
        self.data.lock().map_or(0, |data| data.users.len())
    }

    /// Returns the number of users registered with `email`.
    pub fn users_with_email(&self, email: &str) -> usize {
        self.data.lock().map_or(0, |data| {
            data.users.values().filter(|user| user.email.as_deref() == Some(email)).count()
        })
    }

    /// Returns every registered email, in id order.
    pub fn emails(&self) -> Vec<String> {
        self.data.lock().map_or_else(
            |_| Vec::new(),
            |data| data.users.values().filter_map(|user| user.email.clone()).collect(),
        )
    }
}

impl Drop for FlowStubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Spawns the stub on a loopback port inside the current runtime.
pub async fn spawn_flow_stub(
    options: StubOptions,
) -> Result<FlowStubHandle, Box<dyn std::error::Error>> {
    let data = Arc::new(Mutex::new(StubData::new()));
    let calendar_route = format!("{}/{{file}}", options.calendar_prefix);
    let state = StubState {
        options: Arc::new(options),
        data: Arc::clone(&data),
    };
    let app = Router::new()
        .route("/auth/email/register", post(register))
        .route("/auth/email/login", post(login))
        .route("/auth/facebook/login", post(facebook_login))
        .route("/data/search", get(dump))
        .route("/parse/transcript", post(transcript))
        .route("/parse/schedule", post(schedule))
        .route("/graphql", post(graphql))
        .route("/graph/{app_id}/accounts/test-users", get(test_users))
        .route(&calendar_route, get(calendar))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let base_url = format!("http://{addr}");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let _ = server.await;
    });
    Ok(FlowStubHandle {
        base_url,
        shutdown: Some(shutdown_tx),
        data,
    })
}

// ============================================================================
// SECTION: Auth Routes
// ============================================================================

async fn register(State(state): State<StubState>, body: Bytes) -> Response {
    let body = parse_body(&body);
    let name = str_field(&body, "name");
    let email = str_field(&body, "email");
    let password = str_field(&body, "password");
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "bad_request");
    }
    if password.len() < 6 {
        return error(StatusCode::BAD_REQUEST, "password_too_short");
    }
    if email.len() < 5 {
        return error(StatusCode::BAD_REQUEST, "email_too_short");
    }
    if state.options.reject_registration {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "internal");
    }
    let mut data = match state.lock() {
        Ok(data) => data,
        Err(response) => return response,
    };
    if let Some(existing) = data.find_by_email(email) {
        if state.options.accept_duplicate_registration {
            return (StatusCode::OK, Json(data.open_session(existing))).into_response();
        }
        return error(status(state.options.duplicate_status), "email_taken_by_email");
    }
    let id = data.create_user(Some(email), name, Some(password));
    (StatusCode::OK, Json(data.open_session(id))).into_response()
}

async fn login(State(state): State<StubState>, body: Bytes) -> Response {
    let body = parse_body(&body);
    let email = str_field(&body, "email");
    let password = str_field(&body, "password");
    let mut data = match state.lock() {
        Ok(data) => data,
        Err(response) => return response,
    };
    let Some(id) = data.find_by_email(email) else {
        return error(StatusCode::UNAUTHORIZED, "email_not_registered");
    };
    let matches = data.users.get(&id).and_then(|user| user.password.as_deref()) == Some(password);
    if !matches {
        return error(StatusCode::UNAUTHORIZED, "email_wrong_password");
    }
    (StatusCode::OK, Json(data.open_session(id))).into_response()
}

async fn facebook_login(State(state): State<StubState>, body: Bytes) -> Response {
    let body = parse_body(&body);
    let access_token = str_field(&body, "access_token");
    if access_token.is_empty() {
        return error(StatusCode::BAD_REQUEST, "facebook_auth_bad_request");
    }
    let issued =
        (0..state.options.test_users).any(|index| test_user_token(index) == access_token);
    if !issued {
        return error(StatusCode::UNAUTHORIZED, "facebook_auth_invalid_token");
    }
    let mut data = match state.lock() {
        Ok(data) => data,
        Err(response) => return response,
    };
    let linked = data
        .facebook_links
        .get(access_token)
        .copied()
        .filter(|_| !state.options.relink_facebook_logins);
    let id = match linked {
        Some(id) if data.users.contains_key(&id) => id,
        _ => {
            let id = data.create_user(None, "Open Graph Test User", None);
            data.facebook_links.insert(access_token.to_string(), id);
            id
        }
    };
    let mut envelope = data.open_session(id);
    if state.options.facebook_extra_key
        && let Some(fields) = envelope.as_object_mut()
    {
        fields.insert("is_new_user".to_string(), json!(false));
    }
    (StatusCode::OK, Json(envelope)).into_response()
}

async fn test_users(
    State(state): State<StubState>,
    Path(app_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let expected = format!("{}|{}", state.options.app_id, state.options.app_secret);
    if app_id != state.options.app_id || query.get("access_token") != Some(&expected) {
        let body = json!({ "error": { "message": "Invalid OAuth access token." } });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    let users: Vec<Value> = (0..state.options.test_users)
        .map(|index| {
            json!({
                "id": format!("fb-{index}"),
                "access_token": test_user_token(index),
                "login_url": format!("https://www.facebook.com/login/test-user/{index}"),
            })
        })
        .collect();
    (StatusCode::OK, Json(json!({ "data": users }))).into_response()
}

// ============================================================================
// SECTION: Data Routes
// ============================================================================

async fn dump(State(state): State<StubState>) -> Response {
    let courses: Vec<Value> = (0..state.options.courses)
        .map(|index| {
            json!({
                "id": index,
                "code": format!("cs{}", 100 + index),
                "name": format!("Course {index}"),
                "profs": [index % state.options.profs.max(1)],
                "rating_count": 3,
            })
        })
        .collect();
    let profs: Vec<Value> = (0..state.options.profs)
        .map(|index| {
            json!({
                "id": index,
                "code": format!("prof_{index}"),
                "name": format!("Professor {index}"),
                "courses": [index],
                "rating_count": 5,
            })
        })
        .collect();
    (StatusCode::OK, Json(json!({ "courses": courses, "profs": profs }))).into_response()
}

async fn transcript(
    State(state): State<StubState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = state.authorized(&headers) {
        return response;
    }
    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            upload = field.bytes().await.ok();
            break;
        }
    }
    match upload {
        Some(bytes) if bytes.starts_with(b"%PDF") => {
            let body = json!({ "courses_imported": state.options.transcript_courses });
            (StatusCode::OK, Json(body)).into_response()
        }
        _ => error(StatusCode::BAD_REQUEST, "bad_request"),
    }
}

async fn schedule(State(state): State<StubState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(response) = state.authorized(&headers) {
        return response;
    }
    let body = parse_body(&body);
    if str_field(&body, "text").trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "bad_request");
    }
    let body = json!({ "sections_imported": state.options.schedule_sections });
    (StatusCode::OK, Json(body)).into_response()
}

async fn calendar(State(state): State<StubState>, Path(file): Path<String>) -> Response {
    let secret = file.strip_suffix(".ics").unwrap_or_default();
    let known = state
        .lock()
        .is_ok_and(|data| data.users.values().any(|user| user.secret_id == secret));
    if !known {
        return error(status(state.options.calendar_invalid_status), "calendar_not_found");
    }
    let headers = [(CONTENT_TYPE, "text/calendar; charset=utf-8")];
    (status(state.options.calendar_success_status), headers, stamped_calendar()).into_response()
}

// ============================================================================
// SECTION: GraphQL
// ============================================================================

async fn graphql(State(state): State<StubState>, headers: HeaderMap, body: Bytes) -> Response {
    let body = parse_body(&body);
    let query = str_field(&body, "query");
    let variables = body.get("variables").cloned().unwrap_or(Value::Null);
    let mut data = match state.lock() {
        Ok(data) => data,
        Err(response) => return response,
    };
    let Some(caller) = data.caller(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "unauthorized");
    };
    let id = variables.get("id").and_then(Value::as_i64);
    let result = if query.contains("delete_user") {
        let removed = id == Some(caller) && data.users.remove(&caller).is_some();
        if removed {
            data.facebook_links.retain(|_, linked| *linked != caller);
        }
        let reported = removed || (state.options.delete_always_affects_row && id == Some(caller));
        json!({ "delete_user": { "affected_rows": u8::from(reported) } })
    } else if let Some(email) = variables.get("email").and_then(Value::as_str) {
        let rows: Vec<Value> = data
            .users
            .iter()
            .filter(|(row, user)| **row == caller && user.email.as_deref() == Some(email))
            .map(|(row, _)| json!({ "id": row }))
            .collect();
        json!({ "user": rows })
    } else {
        let rows: Vec<Value> = data
            .users
            .get(&caller)
            .filter(|_| id == Some(caller))
            .map(|user| {
                json!({
                    "id": caller,
                    "full_name": user.full_name,
                    "secret_id": user.secret_id,
                })
            })
            .into_iter()
            .collect();
        json!({ "user": rows })
    };
    (StatusCode::OK, Json(json!({ "data": result }))).into_response()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn error(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn test_user_token(index: usize) -> String {
    format!("fb-test-token-{index}")
}

/// Renders the calendar with CRLF endings and a per-request stamp.
fn stamped_calendar() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let mut lines = Vec::new();
    for line in CALENDAR_EVENTS.lines() {
        lines.push(line.to_string());
        if line == "BEGIN:VEVENT" {
            lines.push(format!("DTSTAMP:{now}"));
        }
    }
    lines.join("\r\n")
}

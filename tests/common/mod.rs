//! In-process fake of the project-management backend.
//!
//! Serves the same routes the gateway calls, records every request, and lets
//! tests seed projects and stories or force error statuses.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use storyboard_mcp::mcp::{BackendClient, ToolDispatcher};
use storyboard_mcp::models::*;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Inner {
    projects: BTreeMap<i64, Project>,
    forbidden: HashSet<i64>,
    stories: BTreeMap<i64, Story>,
    raw_structures: BTreeMap<i64, Value>,
    forced: Option<(StatusCode, Value)>,
    calls: Vec<RecordedCall>,
    next_story_id: i64,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
    base_url: String,
}

impl FakeBackend {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let mut backend = FakeBackend::default();
        backend.inner.lock().unwrap().next_story_id = 1000;

        let app = Router::new()
            .route("/projects/{id}", get(get_project))
            .route("/claude-code/projects/{id}/structure", get(get_structure))
            .route("/stories", post(create_story))
            .route("/stories/{id}", get(get_story))
            .route("/stories/{id}/status", post(update_status))
            .route("/claude-code/health", get(health))
            .layer(middleware::from_fn_with_state(backend.clone(), record_and_guard))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake backend crashed");
        });

        backend.base_url = format!("http://{}", addr);
        backend
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(self.base_url.clone(), TOKEN)
    }

    pub fn dispatcher(&self, default_project: Option<i64>) -> ToolDispatcher {
        ToolDispatcher::new(self.client(), default_project)
    }

    // ============================================================
    // Seeding
    // ============================================================

    pub fn add_project(&self, id: i64, name: &str, progress: Option<f64>) {
        self.inner.lock().unwrap().projects.insert(
            id,
            Project {
                id,
                name: name.to_string(),
                progress,
            },
        );
    }

    /// The project exists but the token may not see it.
    pub fn deny_project(&self, id: i64) {
        self.inner.lock().unwrap().forbidden.insert(id);
    }

    pub fn add_story(&self, story: Story) {
        self.inner.lock().unwrap().stories.insert(story.id, story);
    }

    /// Add `count` stories with ids starting at `first_id`.
    pub fn add_stories(&self, project_id: i64, first_id: i64, count: i64, status: i64) {
        for id in first_id..first_id + count {
            self.add_story(story(id, project_id, status));
        }
    }

    /// Serve this body verbatim for the project's structure.
    pub fn set_raw_structure(&self, project_id: i64, body: Value) {
        self.inner
            .lock()
            .unwrap()
            .raw_structures
            .insert(project_id, body);
    }

    /// Answer every request with this status and body.
    pub fn force_response(&self, status: StatusCode, body: Value) {
        self.inner.lock().unwrap().forced = Some((status, body));
    }

    // ============================================================
    // Inspection
    // ============================================================

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "POST")
            .collect()
    }

    pub fn story_status(&self, id: i64) -> Option<i64> {
        self.inner.lock().unwrap().stories.get(&id).map(|s| s.status)
    }
}

pub fn story(id: i64, project_id: i64, status: i64) -> Story {
    Story {
        id,
        name: format!("Story {}", id),
        description: None,
        status,
        estimate: None,
        epic_id: None,
        project_id,
        created_at: Some("2024-03-05T10:15:00Z".to_string()),
    }
}

fn message(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "message": msg }))).into_response()
}

/// Record the request, check the bearer token and apply any forced response.
async fn record_and_guard(
    State(backend): State<FakeBackend>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let json_body = serde_json::from_slice::<Value>(&bytes).ok();

    let forced = {
        let mut inner = backend.inner.lock().unwrap();
        inner.calls.push(RecordedCall {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            body: json_body,
        });
        inner.forced.clone()
    };

    let authorized = parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        == Some(format!("Bearer {}", TOKEN).as_str());
    if !authorized {
        return message(StatusCode::UNAUTHORIZED, "Invalid API token");
    }

    if let Some((status, body)) = forced {
        return (status, Json(body)).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn get_project(State(backend): State<FakeBackend>, Path(id): Path<i64>) -> Response {
    let inner = backend.inner.lock().unwrap();
    if inner.forbidden.contains(&id) {
        return message(StatusCode::FORBIDDEN, "You do not have access to this project");
    }
    match inner.projects.get(&id) {
        Some(project) => Json(json!({ "success": true, "data": project })).into_response(),
        None => message(StatusCode::NOT_FOUND, &format!("Project {} not found", id)),
    }
}

async fn get_structure(State(backend): State<FakeBackend>, Path(id): Path<i64>) -> Response {
    let inner = backend.inner.lock().unwrap();
    if let Some(raw) = inner.raw_structures.get(&id) {
        return Json(raw.clone()).into_response();
    }
    if inner.forbidden.contains(&id) {
        return message(StatusCode::FORBIDDEN, "You do not have access to this project");
    }
    if !inner.projects.contains_key(&id) {
        return message(StatusCode::NOT_FOUND, &format!("Project {} not found", id));
    }

    let mut epics: BTreeMap<i64, Vec<Story>> = BTreeMap::new();
    let mut loose = Vec::new();
    for story in inner.stories.values().filter(|s| s.project_id == id) {
        match story.epic_id {
            Some(epic_id) => epics.entry(epic_id).or_default().push(story.clone()),
            None => loose.push(story.clone()),
        }
    }
    let epics: Vec<Value> = epics
        .into_iter()
        .map(|(epic_id, stories)| {
            json!({ "id": epic_id, "name": format!("Epic {}", epic_id), "stories": stories })
        })
        .collect();

    Json(json!({
        "project": inner.projects.get(&id),
        "epics": epics,
        "stories": loose,
    }))
    .into_response()
}

async fn create_story(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let mut inner = backend.inner.lock().unwrap();
    let id = inner.next_story_id;
    inner.next_story_id += 1;

    let story = Story {
        id,
        name: body["name"].as_str().unwrap_or_default().to_string(),
        description: body["description"].as_str().map(str::to_string),
        status: body["status"].as_i64().unwrap_or(0),
        estimate: body["estimate"].as_f64(),
        epic_id: body["epic_id"].as_i64(),
        project_id: body["project_id"].as_i64().unwrap_or(0),
        created_at: Some("2024-06-01T09:00:00Z".to_string()),
    };
    inner.stories.insert(id, story.clone());

    (StatusCode::CREATED, Json(story)).into_response()
}

async fn get_story(State(backend): State<FakeBackend>, Path(id): Path<i64>) -> Response {
    let inner = backend.inner.lock().unwrap();
    match inner.stories.get(&id) {
        Some(story) => Json(story.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, &format!("Story {} not found", id)),
    }
}

async fn update_status(
    State(backend): State<FakeBackend>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut inner = backend.inner.lock().unwrap();
    match inner.stories.get_mut(&id) {
        Some(story) => {
            story.status = body["status"].as_i64().unwrap_or(story.status);
            Json(json!({ "success": true })).into_response()
        }
        None => message(StatusCode::NOT_FOUND, &format!("Story {} not found", id)),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

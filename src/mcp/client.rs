//! HTTP client for the project-management backend.
//!
//! Every tool that touches stories or projects goes through [`BackendClient`].
//! It issues exactly one HTTP call per operation, never retries, and maps every
//! failure into a [`GatewayError`].

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::models::*;

/// Backend gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend service error: {0}")]
    ServiceError(String),

    #[error("Cannot reach backend: {0}")]
    Connectivity(String),

    #[error("Unexpected backend response: {0}")]
    Protocol(String),

    #[error("API error: {0}")]
    Api(String),
}

impl GatewayError {
    /// Map a non-success HTTP status to an error kind, keeping the backend's
    /// own message when the body carries one.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = api_message(body);
        match status {
            StatusCode::UNAUTHORIZED => Self::AuthFailure(
                message.unwrap_or_else(|| "API token missing or invalid".to_string()),
            ),
            StatusCode::FORBIDDEN => Self::AccessDenied(
                message.unwrap_or_else(|| "You do not have access to this resource".to_string()),
            ),
            StatusCode::NOT_FOUND => {
                Self::NotFound(message.unwrap_or_else(|| "Resource not found".to_string()))
            }
            s if s.is_server_error() => Self::ServiceError(
                message.unwrap_or_else(|| format!("Backend returned {}", s)),
            ),
            s => Self::Api(message.unwrap_or_else(|| format!("Request failed with status {}", s))),
        }
    }
}

/// Pull a human-readable message out of an error body, if there is one.
fn api_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value
        .get("message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
        })?;
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Unwrap a `{"data": ...}` envelope; bodies without one are the payload.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").is_some_and(|d| !d.is_null()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Integer field that may arrive as a JSON number or a numeric string.
fn lenient_i64(value: &Value, field: &str) -> Option<i64> {
    match value.get(field)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64(value: &Value, field: &str) -> Option<f64> {
    match value.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_str(value: &Value, field: &str) -> Option<String> {
    value.get(field)?.as_str().map(str::to_string)
}

/// Rebuild the created story from whatever the backend echoed, one field at
/// a time, filling gaps from the request. The status is always the one the
/// request carried.
fn created_story(echo: &Value, input: &CreateStoryInput) -> Story {
    Story {
        id: lenient_i64(echo, "id").unwrap_or(0),
        name: lenient_str(echo, "name").unwrap_or_else(|| input.name.clone()),
        description: lenient_str(echo, "description").or_else(|| input.description.clone()),
        status: input.status.code(),
        estimate: lenient_f64(echo, "estimate").or(input.estimate),
        epic_id: lenient_i64(echo, "epic_id").or(input.epic_id),
        project_id: lenient_i64(echo, "project_id").unwrap_or(input.project_id),
        created_at: lenient_str(echo, "created_at"),
    }
}

/// HTTP client for the project-management API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    api_token: String,
    client: Client,
}

impl BackendClient {
    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url.clone(), config.api_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request carrying the bearer token.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url).bearer_auth(&self.api_token)
    }

    /// Send a request; non-success statuses become errors.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        tracing::debug!(%method, path, "backend request");

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "backend unreachable");
            GatewayError::Connectivity(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = GatewayError::from_status(status, &body);
        tracing::warn!(%method, path, %status, error = %err, "backend request failed");
        Err(err)
    }

    /// Decode a success body, unwrapping a `data` envelope when present.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Protocol(format!("failed to read body: {}", e)))?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Protocol(format!("invalid JSON: {}", e)))?;
        serde_json::from_value(unwrap_envelope(value))
            .map_err(|e| GatewayError::Protocol(e.to_string()))
    }

    // ============================================================
    // Project Operations
    // ============================================================

    /// Get a project by ID.
    pub async fn get_project(&self, id: i64) -> Result<Project, GatewayError> {
        let path = format!("/projects/{}", id);
        let response = self
            .send(self.request(Method::GET, &path), Method::GET, &path)
            .await?;
        self.handle_response(response).await
    }

    /// All stories in a project, flattened out of the epic hierarchy.
    pub async fn get_project_stories(&self, project_id: i64) -> Result<Vec<Story>, GatewayError> {
        let path = format!("/claude-code/projects/{}/structure", project_id);
        let response = self
            .send(self.request(Method::GET, &path), Method::GET, &path)
            .await?;
        let structure: ProjectStructure = self.handle_response(response).await.map_err(|e| {
            match e {
                GatewayError::Protocol(msg) => {
                    GatewayError::Protocol(format!("project structure unreadable: {}", msg))
                }
                other => other,
            }
        })?;
        Ok(structure.into_stories(project_id))
    }

    // ============================================================
    // Story Operations
    // ============================================================

    /// Create a story. The input always carries Backlog status.
    ///
    /// The backend may echo only part of the story; missing fields are filled
    /// from the request.
    pub async fn create_story(&self, input: &CreateStoryInput) -> Result<Story, GatewayError> {
        let path = "/stories";
        let response = self
            .send(
                self.request(Method::POST, path).json(input),
                Method::POST,
                path,
            )
            .await?;

        let body = response.text().await.unwrap_or_default();
        let echo = serde_json::from_str::<Value>(&body)
            .map(unwrap_envelope)
            .unwrap_or(Value::Null);
        if echo.get("id").is_none() {
            tracing::warn!("create response carried no story id");
        }

        Ok(created_story(&echo, input))
    }

    /// Get a story by ID.
    pub async fn get_story(&self, id: i64) -> Result<Story, GatewayError> {
        let path = format!("/stories/{}", id);
        let response = self
            .send(self.request(Method::GET, &path), Method::GET, &path)
            .await?;
        self.handle_response(response).await
    }

    /// Write a story's status. No workflow validation happens here.
    pub async fn update_story_status(&self, id: i64, status: i64) -> Result<(), GatewayError> {
        let path = format!("/stories/{}/status", id);
        self.send(
            self.request(Method::POST, &path)
                .json(&serde_json::json!({ "status": status })),
            Method::POST,
            &path,
        )
        .await?;
        Ok(())
    }

    // ============================================================
    // Health
    // ============================================================

    /// Probe backend health. Never fails; any error reads as unhealthy.
    pub async fn health_check(&self) -> bool {
        let path = "/claude-code/health";
        match self
            .send(self.request(Method::GET, path), Method::GET, path)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "health probe failed");
                false
            }
        }
    }
}

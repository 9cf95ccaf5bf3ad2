//! Tool logic behind the MCP surface.
//!
//! [`ToolDispatcher`] validates arguments, resolves which project a call is
//! about, talks to the backend and renders the text answer. It knows nothing
//! about the MCP wire protocol, so it can be driven directly in tests.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use super::client::{BackendClient, GatewayError};
use super::render;
use super::types::*;
use crate::models::*;

/// Largest estimate accepted as input.
pub const MAX_ESTIMATE: f64 = 8.0;

/// Largest estimate that can be created as one story.
pub const MAX_STORY_ESTIMATE: f64 = 6.0;

/// Errors a tool call can fail with.
///
/// Business-rule rejections (oversized estimate, disallowed transition, empty
/// listing) are not errors; they come back as ordinary text.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    Validation(String),

    #[error("No project context set. Call set_project_context first or pass project_id.")]
    NoContext,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// The session's current project.
///
/// Cloning shares the same slot, so every clone of a dispatcher sees the same
/// context. Separate sessions must construct separate dispatchers.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Arc<RwLock<Option<i64>>>,
}

impl SessionContext {
    pub fn new(initial: Option<i64>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    pub async fn get(&self) -> Option<i64> {
        *self.current.read().await
    }

    async fn set(&self, project_id: i64) {
        *self.current.write().await = Some(project_id);
    }
}

fn require_positive(field: &str, value: i64) -> Result<i64, ToolError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ToolError::Validation(format!(
            "{} must be a positive integer, got {}",
            field, value
        )))
    }
}

fn optional_positive(field: &str, value: Option<i64>) -> Result<Option<i64>, ToolError> {
    value.map(|v| require_positive(field, v)).transpose()
}

#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    client: BackendClient,
    context: SessionContext,
}

impl ToolDispatcher {
    pub fn new(client: BackendClient, default_project_id: Option<i64>) -> Self {
        Self {
            client,
            context: SessionContext::new(default_project_id),
        }
    }

    /// The project calls without an explicit `project_id` will use.
    pub async fn current_project(&self) -> Option<i64> {
        self.context.get().await
    }

    /// Explicit argument wins, then the session context, otherwise fail
    /// before any network call.
    async fn resolve_project(&self, explicit: Option<i64>) -> Result<i64, ToolError> {
        if let Some(id) = optional_positive("project_id", explicit)? {
            return Ok(id);
        }
        self.context.get().await.ok_or(ToolError::NoContext)
    }

    // ============================================================
    // Project context
    // ============================================================

    /// Point the session at a project after confirming it exists and is
    /// accessible. The context is untouched when the lookup fails.
    pub async fn set_project_context(
        &self,
        req: SetProjectContextRequest,
    ) -> Result<String, ToolError> {
        let project_id = require_positive("project_id", req.project_id)?;
        let project = self.client.get_project(project_id).await?;

        self.context.set(project.id).await;
        tracing::info!(project_id = project.id, name = %project.name, "project context set");

        Ok(render::context_set(&project))
    }

    pub async fn get_project_info(&self, req: GetProjectInfoRequest) -> Result<String, ToolError> {
        let project_id = self.resolve_project(req.project_id).await?;
        let project = self.client.get_project(project_id).await?;
        let stories = self.client.get_project_stories(project_id).await?;
        Ok(render::project_info(&project, &stories))
    }

    // ============================================================
    // Stories
    // ============================================================

    pub async fn create_story(&self, req: CreateStoryRequest) -> Result<String, ToolError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ToolError::Validation("name must not be empty".to_string()));
        }
        if let Some(estimate) = req.estimate {
            if !(estimate > 0.0 && estimate <= MAX_ESTIMATE) {
                return Err(ToolError::Validation(format!(
                    "estimate must be greater than 0 and at most {}, got {}",
                    MAX_ESTIMATE, estimate
                )));
            }
        }
        let epic_id = optional_positive("epic_id", req.epic_id)?;
        let project_id = self.resolve_project(req.project_id).await?;

        if let Some(estimate) = req.estimate.filter(|e| *e > MAX_STORY_ESTIMATE) {
            tracing::info!(name, estimate, "story not created: estimate too large");
            return Ok(render::estimate_too_large(name, estimate));
        }

        let description = req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let input = CreateStoryInput::new(project_id, name, description, req.estimate, epic_id);
        let story = self.client.create_story(&input).await?;

        tracing::info!(story_id = story.id, project_id, "story created");
        Ok(render::story_created(&story))
    }

    /// Move a story along the workflow. Moves the workflow does not allow are
    /// answered with a warning and never written.
    pub async fn update_story_status(
        &self,
        req: UpdateStoryStatusRequest,
    ) -> Result<String, ToolError> {
        let story_id = require_positive("story_id", req.story_id)?;
        let target = req.status.to_status().map_err(ToolError::Validation)?;

        let story = self.client.get_story(story_id).await?;
        let current = match story.workflow_status() {
            Some(current) if current.can_transition_to(target) => current,
            _ => {
                tracing::info!(
                    story_id,
                    from = story.status,
                    to = target.code(),
                    "status transition rejected"
                );
                return Ok(render::invalid_transition(&story, target));
            }
        };

        self.client
            .update_story_status(story_id, target.code())
            .await?;

        tracing::info!(story_id, from = %current, to = %target, "story status updated");
        Ok(render::status_updated(
            &story,
            current,
            target,
            req.notes.as_deref(),
        ))
    }

    pub async fn get_story(&self, req: GetStoryRequest) -> Result<String, ToolError> {
        let story_id = require_positive("story_id", req.story_id)?;
        let story = self.client.get_story(story_id).await?;
        Ok(render::story_details(&story))
    }

    pub async fn list_my_stories(&self, req: ListStoriesRequest) -> Result<String, ToolError> {
        let filter = match req.status {
            Some(ref status) => status.to_filter().map_err(ToolError::Validation)?,
            None => StatusFilter::All,
        };
        let project_id = self.resolve_project(req.project_id).await?;

        let stories = self.client.get_project_stories(project_id).await?;
        let matching: Vec<&Story> = stories.iter().filter(|s| filter.matches(s.status)).collect();

        if matching.is_empty() {
            return Ok(render::no_stories(project_id, filter));
        }
        Ok(render::story_list(project_id, filter, &matching))
    }
}

//! Request types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::StoryStatus;

// ============================================================
// Status arguments
// ============================================================

/// A status as it arrives from a tool call: `3` and `"3"` are both accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StatusArg {
    Number(i64),
    Text(String),
}

impl StatusArg {
    /// Strictly coerce to a workflow status. Only 1, 3 and 5 are valid.
    pub fn to_status(&self) -> Result<StoryStatus, String> {
        let code = match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<i64>().ok(),
        };
        code.and_then(StoryStatus::from_code)
            .ok_or_else(|| format!("Invalid status {}. Must be 1 (Backlog), 3 (In Progress), or 5 (Done)", self))
    }

    /// Coerce to a list filter, which additionally accepts `"all"`.
    pub fn to_filter(&self) -> Result<StatusFilter, String> {
        match self {
            Self::Text(s) if s.trim().eq_ignore_ascii_case("all") => Ok(StatusFilter::All),
            _ => self.to_status().map(StatusFilter::Only).map_err(|_| {
                format!(
                    "Invalid status filter {}. Must be 1 (Backlog), 3 (In Progress), 5 (Done), or \"all\"",
                    self
                )
            }),
        }
    }
}

impl std::fmt::Display for StatusArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "'{}'", s),
        }
    }
}

/// Which stories `list_my_stories` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(StoryStatus),
}

impl StatusFilter {
    pub fn matches(&self, status_code: i64) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => status.code() == status_code,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.label(),
        }
    }
}

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetProjectContextRequest {
    #[schemars(description = "The numeric ID of the project to work in for this session")]
    pub project_id: i64,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetProjectInfoRequest {
    #[schemars(description = "Project ID. Defaults to the current project context")]
    #[serde(default)]
    pub project_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreateStoryRequest {
    #[schemars(description = "Short name of the story")]
    pub name: String,
    #[schemars(description = "What the story delivers and how to verify it")]
    #[serde(default)]
    pub description: Option<String>,
    #[schemars(
        description = "Story point estimate, greater than 0 and at most 8. Estimates above 6 are rejected with a suggestion to split the story"
    )]
    #[serde(default)]
    pub estimate: Option<f64>,
    #[schemars(description = "Epic ID to file the story under")]
    #[serde(default)]
    pub epic_id: Option<i64>,
    #[schemars(description = "Project ID. Defaults to the current project context")]
    #[serde(default)]
    pub project_id: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateStoryStatusRequest {
    #[schemars(description = "The numeric ID of the story")]
    pub story_id: i64,
    #[schemars(description = "Target status: 1 (Backlog), 3 (In Progress), or 5 (Done)")]
    pub status: StatusArg,
    #[schemars(description = "Optional notes about the change")]
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetStoryRequest {
    #[schemars(description = "The numeric ID of the story")]
    pub story_id: i64,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListStoriesRequest {
    #[schemars(
        description = "Status filter: 1 (Backlog), 3 (In Progress), 5 (Done), or \"all\". Defaults to all"
    )]
    #[serde(default)]
    pub status: Option<StatusArg>,
    #[schemars(description = "Project ID. Defaults to the current project context")]
    #[serde(default)]
    pub project_id: Option<i64>,
}

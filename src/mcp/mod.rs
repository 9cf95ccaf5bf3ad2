//! MCP server exposing story tracking tools to an agent.

pub mod client;
pub mod render;
mod tools;
mod types;

pub use client::{BackendClient, GatewayError};
pub use tools::*;
pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};

use crate::config::Config;

/// One MCP session's worth of tools. The session's project context lives in
/// the dispatcher, so each session needs its own `StoryServer`.
#[derive(Clone)]
pub struct StoryServer {
    dispatcher: ToolDispatcher,
    tool_router: ToolRouter<Self>,
}

impl StoryServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self {
            dispatcher,
            tool_router: Self::tool_router(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ToolDispatcher::new(
            BackendClient::from_config(config),
            config.default_project_id,
        ))
    }

    /// Convert a tool outcome into an MCP result. Bad arguments are reported
    /// as invalid params; everything else is a tool execution failure.
    fn respond(result: Result<String, ToolError>) -> Result<CallToolResult, McpError> {
        match result {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(ToolError::Validation(msg)) => Err(McpError::invalid_params(msg, None)),
            Err(e) => {
                tracing::warn!(error = %e, "tool execution failed");
                Err(McpError::internal_error(
                    format!("Tool execution failed: {}", e),
                    None,
                ))
            }
        }
    }
}

#[tool_router]
impl StoryServer {
    // ============================================================
    // Project Tools
    // ============================================================

    #[tool(
        description = "Set the current project for this session. Verifies the project exists and is accessible, then makes it the default for get_project_info, create_story and list_my_stories. Returns the project name and progress."
    )]
    async fn set_project_context(
        &self,
        params: Parameters<SetProjectContextRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.dispatcher.set_project_context(params.0).await)
    }

    #[tool(
        description = "Summarize a project: progress, story counts by status (Backlog, In Progress, Done) and up to three stories to work on next. Uses the current project context unless project_id is given."
    )]
    async fn get_project_info(
        &self,
        params: Parameters<GetProjectInfoRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.dispatcher.get_project_info(params.0).await)
    }

    // ============================================================
    // Story Tools
    // ============================================================

    #[tool(
        description = "Create a story in the Backlog. Name is required; description, estimate (1-8 points), epic_id and project_id are optional. Stories estimated above 6 points are not created; split them into smaller stories instead."
    )]
    async fn create_story(
        &self,
        params: Parameters<CreateStoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.dispatcher.create_story(params.0).await)
    }

    #[tool(
        description = "Move a story to a new status: 1 (Backlog), 3 (In Progress), 5 (Done). Allowed moves: Backlog → In Progress; In Progress → Done or Backlog; Done → Backlog or In Progress. Disallowed moves return a warning and change nothing."
    )]
    async fn update_story_status(
        &self,
        params: Parameters<UpdateStoryStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.dispatcher.update_story_status(params.0).await)
    }

    #[tool(
        description = "Get full details of a story by ID: status, estimate, epic, creation date, description and a hint about what to do next."
    )]
    async fn get_story(
        &self,
        params: Parameters<GetStoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.dispatcher.get_story(params.0).await)
    }

    #[tool(
        description = "List stories in a project, optionally filtered by status (1, 3, 5 or \"all\"). Shows at most 10 stories. Uses the current project context unless project_id is given."
    )]
    async fn list_my_stories(
        &self,
        params: Parameters<ListStoriesRequest>,
    ) -> Result<CallToolResult, McpError> {
        Self::respond(self.dispatcher.list_my_stories(params.0).await)
    }
}

#[tool_handler]
impl ServerHandler for StoryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "storyboard".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"Storyboard tracks the stories of a project.

GETTING STARTED:
1. set_project_context with the project ID you are working in
2. get_project_info to see progress and what to pick up next

STORY STATUSES:
- 1 Backlog: not started
- 3 In Progress: being worked on
- 5 Done: complete

ALLOWED MOVES:
- Backlog → In Progress
- In Progress → Done or Backlog
- Done → Backlog or In Progress
Any other move is refused with a warning and nothing changes.

WORKFLOW:
- list_my_stories / get_story: find and read a story
- update_story_status to 3 when you start, to 5 when it is verified
- create_story for new work; keep estimates at 6 points or less

New stories always start in the Backlog."#;

pub async fn run_stdio_server(config: Config) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!(backend = %config.base_url, "Starting MCP server via stdio");

    let service = StoryServer::from_config(&config);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}

//! Startup configuration.
//!
//! Supplied once when the process starts and never changed afterwards:
//! - `STORYBOARD_API_URL` - Backend base URL (default: `http://localhost:3000/api`)
//! - `STORYBOARD_API_TOKEN` - Bearer token for the backend (required)
//! - `STORYBOARD_PROJECT_ID` - Project to use when a tool call names none (optional)

use anyhow::{bail, Result};

/// Default backend URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

pub const API_URL_ENV: &str = "STORYBOARD_API_URL";
pub const API_TOKEN_ENV: &str = "STORYBOARD_API_TOKEN";
pub const PROJECT_ID_ENV: &str = "STORYBOARD_PROJECT_ID";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub api_token: String,
    pub default_project_id: Option<i64>,
}

impl Config {
    /// Build a validated configuration.
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        default_project_id: Option<i64>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let api_token = api_token.into();

        if base_url.is_empty() {
            bail!("Backend URL must not be empty");
        }
        if api_token.trim().is_empty() {
            bail!("API token is required (set {})", API_TOKEN_ENV);
        }
        if let Some(id) = default_project_id {
            if id <= 0 {
                bail!("Default project id must be a positive integer, got {}", id);
            }
        }

        Ok(Self {
            base_url,
            api_token,
            default_project_id,
        })
    }
}

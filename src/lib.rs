//! Storyboard: an MCP adapter that lets an agent track project stories in a
//! project-management backend.

pub mod api;
pub mod config;
pub mod mcp;
pub mod models;

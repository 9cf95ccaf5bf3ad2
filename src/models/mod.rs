//! Domain models for the story tracker.
//!
//! # Core Concepts
//!
//! - [`Project`]: Container of stories. Sourced from the backend, read-only here.
//! - [`Story`]: Unit of trackable work with a lifecycle [`StoryStatus`].
//! - [`ProjectStructure`]: The backend's epic-grouped view of a project's stories.
//!
//! The backend is the system of record. The only local rule is the status
//! workflow in [`StoryStatus::allowed_transitions`].

mod project;
mod story;

pub use project::*;
pub use story::*;

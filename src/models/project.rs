use serde::{Deserialize, Serialize};

use super::Story;

/// A project as reported by the backend.
///
/// Read-only from this side: the adapter never creates or edits projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    /// Completion percentage, when the backend computes one.
    #[serde(default, alias = "progress_percentage")]
    pub progress: Option<f64>,
}

/// A story as it appears inside the project structure response.
///
/// The response is scoped to one project, so `project_id` and `epic_id` may
/// be left out and are filled in while flattening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: i64,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub epic_id: Option<i64>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl StoryNode {
    fn into_story(self, project_id: i64, epic_id: Option<i64>) -> Story {
        Story {
            id: self.id,
            name: self.name,
            description: self.description,
            status: self.status,
            estimate: self.estimate,
            epic_id: self.epic_id.or(epic_id),
            project_id: self.project_id.unwrap_or(project_id),
            created_at: self.created_at,
        }
    }
}

/// An epic node in the project structure response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicNode {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stories: Vec<StoryNode>,
}

/// The backend's hierarchical view of a project: stories grouped under
/// epics plus any stories that belong to no epic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStructure {
    pub epics: Vec<EpicNode>,
    #[serde(default)]
    pub stories: Vec<StoryNode>,
}

impl ProjectStructure {
    /// Flatten into one ordered list: epic stories in epic order, then the
    /// project-level stories. Nested stories without an `epic_id` inherit
    /// the id of the epic they were found under; stories without a
    /// `project_id` get the project the structure was fetched for.
    pub fn into_stories(self, project_id: i64) -> Vec<Story> {
        let mut flat = Vec::new();
        for epic in self.epics {
            for node in epic.stories {
                flat.push(node.into_story(project_id, Some(epic.id)));
            }
        }
        flat.extend(
            self.stories
                .into_iter()
                .map(|node| node.into_story(project_id, None)),
        );
        flat
    }
}

use serde::{Deserialize, Serialize};

/// A unit of trackable work belonging to a project.
///
/// Stories are owned by the backend. Every change round-trips through it;
/// nothing here mutates a story locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw status code as reported by the backend. See [`StoryStatus`].
    pub status: i64,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub epic_id: Option<i64>,
    pub project_id: i64,
    /// Creation timestamp, kept as the backend's string (usually RFC 3339).
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Story {
    /// The workflow status, or `None` when the backend reports a code outside
    /// the Backlog / In Progress / Done set.
    pub fn workflow_status(&self) -> Option<StoryStatus> {
        StoryStatus::from_code(self.status)
    }
}

/// The lifecycle status of a story.
///
/// - `Backlog` (1): not started
/// - `InProgress` (3): actively being worked on
/// - `Done` (5): complete
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "i64", try_from = "i64")]
pub enum StoryStatus {
    Backlog,
    InProgress,
    Done,
}

impl StoryStatus {
    pub const ALL: [StoryStatus; 3] = [Self::Backlog, Self::InProgress, Self::Done];

    pub fn code(&self) -> i64 {
        match self {
            Self::Backlog => 1,
            Self::InProgress => 3,
            Self::Done => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Backlog),
            3 => Some(Self::InProgress),
            5 => Some(Self::Done),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Statuses a story may move to from this one.
    ///
    /// Backlog only advances to In Progress. In Progress and Done may each
    /// move to either of the other two statuses.
    pub fn allowed_transitions(&self) -> &'static [StoryStatus] {
        match self {
            Self::Backlog => &[Self::InProgress],
            Self::InProgress => &[Self::Done, Self::Backlog],
            Self::Done => &[Self::Backlog, Self::InProgress],
        }
    }

    pub fn can_transition_to(&self, target: StoryStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }
}

impl From<StoryStatus> for i64 {
    fn from(status: StoryStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i64> for StoryStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown story status {}", code))
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Body sent to the backend to create a story.
///
/// `status` is always Backlog; construct through [`CreateStoryInput::new`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateStoryInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<i64>,
    pub project_id: i64,
    pub status: StoryStatus,
}

impl CreateStoryInput {
    pub fn new(
        project_id: i64,
        name: impl Into<String>,
        description: Option<String>,
        estimate: Option<f64>,
        epic_id: Option<i64>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            estimate,
            epic_id,
            project_id,
            status: StoryStatus::Backlog,
        }
    }
}

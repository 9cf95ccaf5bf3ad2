//! Text payloads returned by the story tools.
//!
//! Every tool answers with a single block of text meant to be shown to the
//! agent as-is.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::types::StatusFilter;
use crate::models::{Project, Story, StoryStatus};

/// Most stories shown by `list_my_stories`.
pub const LIST_LIMIT: usize = 10;

/// Most suggestions shown by `get_project_info`.
pub const SUGGESTION_LIMIT: usize = 3;

/// Render story points without a trailing `.0`.
pub fn points(estimate: f64) -> String {
    let unit = if estimate == 1.0 { "point" } else { "points" };
    if estimate.fract() == 0.0 {
        format!("{} {}", estimate as i64, unit)
    } else {
        format!("{} {}", estimate, unit)
    }
}

fn progress(progress: Option<f64>) -> String {
    match progress {
        Some(p) if p.fract() == 0.0 => format!("{}%", p as i64),
        Some(p) => format!("{:.1}%", p),
        None => "not reported".to_string(),
    }
}

/// Label for a raw status code, including codes outside the workflow.
pub fn status_label(code: i64) -> String {
    match StoryStatus::from_code(code) {
        Some(status) => status.label().to_string(),
        None => format!("Unknown ({})", code),
    }
}

const HUMAN_DATE: &str = "%B %-d, %Y";

/// Timestamp layouts without an offset that backends commonly send.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Human date for a backend timestamp; unparseable values pass through.
pub fn human_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(HUMAN_DATE).to_string();
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return dt.format(HUMAN_DATE).to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(HUMAN_DATE).to_string();
    }
    raw.to_string()
}

fn estimate_text(story: &Story) -> String {
    story
        .estimate
        .map(points)
        .unwrap_or_else(|| "not estimated".to_string())
}

fn story_line(story: &Story) -> String {
    let mut line = format!("#{} [{}] {}", story.id, status_label(story.status), story.name);
    if let Some(estimate) = story.estimate {
        line.push_str(&format!(" ({})", points(estimate)));
    }
    line
}

// ============================================================
// Project context
// ============================================================

pub fn context_set(project: &Project) -> String {
    format!(
        "Project context set to \"{}\" (ID: {})\nProgress: {}\n\nTools that take an optional project_id will now use this project.",
        project.name,
        project.id,
        progress(project.progress)
    )
}

pub fn project_info(project: &Project, stories: &[Story]) -> String {
    let by_status = |status: StoryStatus| {
        stories
            .iter()
            .filter(|s| s.status == status.code())
            .collect::<Vec<_>>()
    };
    let backlog = by_status(StoryStatus::Backlog);
    let in_progress = by_status(StoryStatus::InProgress);
    let done = by_status(StoryStatus::Done);

    let mut out = format!(
        "Project: {} (ID: {})\nProgress: {}\n\n",
        project.name,
        project.id,
        progress(project.progress)
    );
    out.push_str(&format!(
        "Stories: {} total\n  Backlog: {}\n  In Progress: {}\n  Done: {}\n\n",
        stories.len(),
        backlog.len(),
        in_progress.len(),
        done.len()
    ));

    let (heading, picks) = if !in_progress.is_empty() {
        ("Next to work on (in progress):", in_progress)
    } else if !backlog.is_empty() {
        ("Next to work on (from backlog):", backlog)
    } else {
        out.push_str("Nothing in progress or waiting in the backlog.");
        return out;
    };

    out.push_str(heading);
    for story in picks.iter().take(SUGGESTION_LIMIT) {
        out.push_str("\n  - ");
        out.push_str(&story_line(story));
    }
    out
}

// ============================================================
// Story creation
// ============================================================

/// Soft rejection for estimates too large to be one story.
pub fn estimate_too_large(name: &str, estimate: f64) -> String {
    format!(
        "Story \"{name}\" was not created: an estimate of {est} is too large for a single story (maximum is 6).\n\
         \n\
         Consider splitting it into smaller stories, for example:\n\
         \x20 1. {name}: research and design (2 points)\n\
         \x20 2. {name}: core implementation (3 points)\n\
         \x20 3. {name}: tests and polish (2 points)\n\
         \n\
         Create each piece separately with create_story.",
        name = name,
        est = points(estimate),
    )
}

pub fn story_created(story: &Story) -> String {
    let mut out = format!(
        "Created story #{}: {}\nDescription: {}\nEstimate: {}\nStatus: {}\n",
        story.id,
        story.name,
        story.description.as_deref().unwrap_or("none"),
        estimate_text(story),
        status_label(story.status)
    );
    if let Some(epic_id) = story.epic_id {
        out.push_str(&format!("Epic: {}\n", epic_id));
    }
    out.push_str(&format!("Project: {}", story.project_id));
    out
}

// ============================================================
// Status updates
// ============================================================

fn join_labels(statuses: &[StoryStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Soft rejection for a move the workflow does not allow.
pub fn invalid_transition(story: &Story, target: StoryStatus) -> String {
    let allowed = story
        .workflow_status()
        .map(|s| s.allowed_transitions())
        .unwrap_or(&[]);
    format!(
        "Cannot move story #{} \"{}\" from {} to {}.\nCurrent status: {}\nAllowed next status: {}\n\nNo change was made.",
        story.id,
        story.name,
        status_label(story.status),
        target.label(),
        status_label(story.status),
        join_labels(allowed)
    )
}

pub fn status_updated(
    story: &Story,
    from: StoryStatus,
    to: StoryStatus,
    notes: Option<&str>,
) -> String {
    let mut out = format!(
        "Story #{} \"{}\" moved: {} → {}",
        story.id,
        story.name,
        from.label(),
        to.label()
    );
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        out.push_str("\nNotes: ");
        out.push_str(notes.trim());
    }
    match to {
        StoryStatus::InProgress => {
            out.push_str("\n\nWork has started. Keep the story updated as it moves along.")
        }
        StoryStatus::Done => out.push_str("\n\nNice work, this story is complete."),
        StoryStatus::Backlog => {}
    }
    out
}

// ============================================================
// Story lookup and listing
// ============================================================

pub fn story_details(story: &Story) -> String {
    let mut out = format!(
        "Story #{}: {}\nStatus: {}\nProject: {}\n",
        story.id,
        story.name,
        status_label(story.status),
        story.project_id
    );
    if let Some(epic_id) = story.epic_id {
        out.push_str(&format!("Epic: {}\n", epic_id));
    }
    out.push_str(&format!("Estimate: {}\n", estimate_text(story)));
    if let Some(created) = story.created_at.as_deref() {
        out.push_str(&format!("Created: {}\n", human_date(created)));
    }
    if let Some(description) = story.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str(&format!("\nDescription:\n{}\n", description.trim()));
    }

    let hint = match story.workflow_status() {
        Some(StoryStatus::Backlog) => {
            Some("Move it to In Progress (status 3) when you start working on it.")
        }
        Some(StoryStatus::InProgress) => Some("This story is currently active."),
        Some(StoryStatus::Done) => Some("This story is complete."),
        None => None,
    };
    if let Some(hint) = hint {
        out.push_str("\nHint: ");
        out.push_str(hint);
    }
    out.trim_end().to_string()
}

pub fn no_stories(project_id: i64, filter: StatusFilter) -> String {
    format!(
        "No stories found in project {} with status filter \"{}\".",
        project_id,
        filter.label()
    )
}

pub fn story_list(project_id: i64, filter: StatusFilter, stories: &[&Story]) -> String {
    let mut out = format!(
        "Stories in project {} (filter: {}): {}",
        project_id,
        filter.label(),
        stories.len()
    );
    for story in stories.iter().take(LIST_LIMIT) {
        out.push_str("\n  ");
        out.push_str(&story_line(story));
    }
    if stories.len() > LIST_LIMIT {
        out.push_str(&format!("\n  ...and {} more", stories.len() - LIST_LIMIT));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: i64, status: i64) -> Story {
        Story {
            id,
            name: format!("Story {}", id),
            description: None,
            status,
            estimate: None,
            epic_id: None,
            project_id: 1,
            created_at: None,
        }
    }

    #[test]
    fn points_drop_trailing_zero() {
        assert_eq!(points(3.0), "3 points");
        assert_eq!(points(1.0), "1 point");
        assert_eq!(points(2.5), "2.5 points");
    }

    #[test]
    fn human_date_formats_rfc3339_and_plain_dates() {
        assert_eq!(human_date("2024-03-05T10:15:00Z"), "March 5, 2024");
        assert_eq!(human_date("2024-11-20"), "November 20, 2024");
        assert_eq!(human_date("2024-03-05T10:15:00"), "March 5, 2024");
        assert_eq!(human_date("2024-03-05 10:15:00"), "March 5, 2024");
        assert_eq!(human_date("2024-03-05T10:15:00.123"), "March 5, 2024");
        assert_eq!(human_date("yesterday"), "yesterday");
    }

    #[test]
    fn project_info_prefers_in_progress_suggestions() {
        let project = Project {
            id: 42,
            name: "Apollo".into(),
            progress: Some(40.0),
        };
        let stories: Vec<Story> = vec![
            story(1, 1),
            story(2, 3),
            story(3, 3),
            story(4, 3),
            story(5, 3),
            story(6, 5),
        ];

        let text = project_info(&project, &stories);
        assert!(text.contains("Progress: 40%"));
        assert!(text.contains("Backlog: 1"));
        assert!(text.contains("In Progress: 4"));
        assert!(text.contains("Done: 1"));
        assert!(text.contains("#2 "));
        assert!(text.contains("#4 "));
        assert!(!text.contains("#5 "));
        assert!(!text.contains("#1 "));
    }

    #[test]
    fn project_info_falls_back_to_backlog() {
        let project = Project {
            id: 42,
            name: "Apollo".into(),
            progress: None,
        };
        let stories = vec![story(1, 1), story(2, 5)];

        let text = project_info(&project, &stories);
        assert!(text.contains("from backlog"));
        assert!(text.contains("#1 [Backlog] Story 1"));
        assert!(text.contains("Progress: not reported"));
    }

    #[test]
    fn list_truncates_with_remaining_count() {
        let stories: Vec<Story> = (1..=13).map(|id| story(id, 1)).collect();
        let refs: Vec<&Story> = stories.iter().collect();

        let text = story_list(5, StatusFilter::All, &refs);
        assert!(text.contains("#10 "));
        assert!(!text.contains("#11 "));
        assert!(text.ends_with("...and 3 more"));
    }

    #[test]
    fn list_without_overflow_has_no_suffix() {
        let stories: Vec<Story> = (1..=10).map(|id| story(id, 3)).collect();
        let refs: Vec<&Story> = stories.iter().collect();

        let text = story_list(5, StatusFilter::All, &refs);
        assert!(!text.contains("more"));
    }

    #[test]
    fn invalid_transition_lists_allowed_statuses() {
        let text = invalid_transition(&story(8, 1), StoryStatus::Done);
        assert!(text.contains("from Backlog to Done"));
        assert!(text.contains("Allowed next status: In Progress\n"));
    }

    #[test]
    fn invalid_transition_for_unknown_status_allows_nothing() {
        let text = invalid_transition(&story(8, 2), StoryStatus::Done);
        assert!(text.contains("Unknown (2)"));
        assert!(text.contains("Allowed next status: none"));
    }

    #[test]
    fn story_details_include_hint_and_date() {
        let mut s = story(3, 3);
        s.created_at = Some("2024-03-05T10:15:00Z".into());
        let text = story_details(&s);
        assert!(text.contains("Created: March 5, 2024"));
        assert!(text.ends_with("Hint: This story is currently active."));
    }
}

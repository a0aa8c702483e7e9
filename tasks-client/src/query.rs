use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::api::Task;
use crate::api::TaskStatus;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Earliest deadline first; tasks without one go last.
    #[default]
    Deadline,
    /// High, then medium, then low.
    Priority,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Deadline => "deadline",
            SortKey::Priority => "priority",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deadline" => Ok(SortKey::Deadline),
            "priority" => Ok(SortKey::Priority),
            other => Err(format!(
                "unknown sort key `{other}` (expected deadline or priority)"
            )),
        }
    }
}

/// Client-side filtering and ordering of a fetched task list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Case-insensitive substring matched against title and description.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub sort: SortKey,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        let matches_status = self.status.is_none_or(|s| task.status == s);
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            }
        };
        matches_status && matches_search
    }

    pub fn apply(&self, tasks: impl IntoIterator<Item = Task>) -> Vec<Task> {
        let mut out: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        match self.sort {
            SortKey::Deadline => out.sort_by(|a, b| match (a.deadline, b.deadline) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }),
            SortKey::Priority => out.sort_by_key(|t| t.priority.rank()),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TaskId;
    use crate::api::TaskPriority;
    use crate::wire::parse_datetime;
    use pretty_assertions::assert_eq;

    fn task(id: &str, title: &str, priority: TaskPriority, deadline: Option<&str>) -> Task {
        Task {
            id: TaskId(id.to_string()),
            title: title.to_string(),
            description: format!("about {title}"),
            status: TaskStatus::Pending,
            priority,
            assignee: None,
            deadline: deadline.and_then(parse_datetime),
            created_at: None,
            updated_at: None,
            completed_at: None,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.0.as_str()).collect()
    }

    fn sample() -> Vec<Task> {
        let mut done = task("3", "Ship release", TaskPriority::Low, Some("2025-01-05"));
        done.status = TaskStatus::Completed;
        vec![
            task("1", "Write report", TaskPriority::Medium, Some("2025-02-01")),
            task("2", "Call supplier", TaskPriority::High, None),
            done,
            task("4", "Review REPORT draft", TaskPriority::High, Some("2025-01-20")),
        ]
    }

    #[test]
    fn sorts_by_deadline_with_missing_last() {
        let sorted = TaskQuery::default().apply(sample());
        assert_eq!(ids(&sorted), vec!["3", "4", "1", "2"]);
    }

    #[test]
    fn sorts_by_priority_stably() {
        let query = TaskQuery {
            sort: SortKey::Priority,
            ..TaskQuery::default()
        };
        assert_eq!(ids(&query.apply(sample())), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let query = TaskQuery {
            search: Some("report".to_string()),
            ..TaskQuery::default()
        };
        assert_eq!(ids(&query.apply(sample())), vec!["4", "1"]);

        let by_description = TaskQuery {
            search: Some("ABOUT call".to_string()),
            ..TaskQuery::default()
        };
        assert_eq!(ids(&by_description.apply(sample())), vec!["2"]);
    }

    #[test]
    fn filters_by_status() {
        let query = TaskQuery {
            status: Some(TaskStatus::Completed),
            search: Some("  ".to_string()),
            sort: SortKey::Deadline,
        };
        assert_eq!(ids(&query.apply(sample())), vec!["3"]);
    }
}

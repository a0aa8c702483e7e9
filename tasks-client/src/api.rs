use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use taskboard_backend_client::ApiError;

pub type Result<T> = std::result::Result<T, TaskError>;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The backend answered, but not in the shape the wire format expects.
    #[error("unexpected response shape: {0}")]
    Wire(String),
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("invalid task id `{0}`")]
    InvalidId(TaskId),
    #[error("backend returned no content for {0}")]
    EmptyResponse(String),
}

impl TaskError {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, TaskError::Api(err) if err.is_auth_error())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Accepts every spelling the known backends use; anything unrecognized
    /// is treated as pending.
    pub fn parse_lenient(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "in progress" => TaskStatus::InProgress,
            "completed" | "done" => TaskStatus::Completed,
            _ => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "pending" | "new" => Ok(TaskStatus::Pending),
            "in progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(format!(
                "unknown status `{s}` (expected pending, in-progress or completed)"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    /// Sort rank, most urgent first.
    pub fn rank(self) -> u8 {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 2,
        }
    }

    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" | "normal" => Ok(TaskPriority::Medium),
            "high" | "urgent" => Ok(TaskPriority::High),
            _ => Err(format!(
                "unknown priority `{s}` (expected low, medium or high)"
            )),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['_', '-'], " ")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial update; `None` fields are left untouched on the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[async_trait::async_trait]
pub trait TaskBackend: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>>;
    async fn create_task(&self, task: NewTask) -> Result<Task>;
    async fn update_task(&self, id: &TaskId, update: TaskUpdate) -> Result<Task>;
    async fn delete_task(&self, id: &TaskId) -> Result<()>;
    /// Server-side "mark complete" action, distinct from a status update.
    async fn mark_completed(&self, id: &TaskId) -> Result<()>;

    async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        self.update_task(id, TaskUpdate::status(status)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_parsing_accepts_backend_spellings() {
        assert_eq!(TaskStatus::parse_lenient("IN_PROGRESS"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::parse_lenient("in progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::parse_lenient("in-progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::parse_lenient("Done"), TaskStatus::Completed);
        assert_eq!(TaskStatus::parse_lenient("new"), TaskStatus::Pending);
        assert_eq!(TaskStatus::parse_lenient("archived"), TaskStatus::Pending);
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn priority_parsing_accepts_backend_spellings() {
        assert_eq!(TaskPriority::parse_lenient("URGENT"), TaskPriority::High);
        assert_eq!(TaskPriority::parse_lenient("normal"), TaskPriority::Medium);
        assert_eq!(TaskPriority::parse_lenient("LOW"), TaskPriority::Low);
        assert_eq!(TaskPriority::parse_lenient(""), TaskPriority::Medium);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(TaskUpdate::default().is_empty());
        assert!(!TaskUpdate::status(TaskStatus::Completed).is_empty());
    }
}

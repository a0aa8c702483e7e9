//! Translation between [`Task`] and the JSON shapes of the supported
//! backends. The authenticated client never sees these field names.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::api::NewTask;
use crate::api::Result;
use crate::api::Task;
use crate::api::TaskError;
use crate::api::TaskId;
use crate::api::TaskPriority;
use crate::api::TaskStatus;
use crate::api::TaskUpdate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `title`/`status`/`priority`/`due_date`, upper-case status and
    /// priority values.
    #[default]
    Django,
    /// `task_name`/`task_status`/`task_priority`/`deadline`, assignee nested
    /// under `employee_info`.
    Employee,
    /// Flat table rows with lower-case values and `deadline`/`completed_at`.
    Table,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WireFormat::Django => "django",
            WireFormat::Employee => "employee",
            WireFormat::Table => "table",
        })
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "django" => Ok(WireFormat::Django),
            "employee" => Ok(WireFormat::Employee),
            "table" => Ok(WireFormat::Table),
            other => Err(format!(
                "unknown wire format `{other}` (expected django, employee or table)"
            )),
        }
    }
}

struct FieldNames {
    title: &'static str,
    status: &'static str,
    priority: &'static str,
    deadline: &'static str,
}

impl WireFormat {
    fn fields(self) -> FieldNames {
        match self {
            WireFormat::Django => FieldNames {
                title: "title",
                status: "status",
                priority: "priority",
                deadline: "due_date",
            },
            WireFormat::Employee => FieldNames {
                title: "task_name",
                status: "task_status",
                priority: "task_priority",
                deadline: "deadline",
            },
            WireFormat::Table => FieldNames {
                title: "title",
                status: "status",
                priority: "priority",
                deadline: "deadline",
            },
        }
    }

    fn encode_status(self, status: TaskStatus) -> &'static str {
        match (self, status) {
            (WireFormat::Table, s) => s.as_str(),
            (_, TaskStatus::Pending) => "PENDING",
            (_, TaskStatus::InProgress) => "IN_PROGRESS",
            (_, TaskStatus::Completed) => "COMPLETED",
        }
    }

    fn encode_priority(self, priority: TaskPriority) -> &'static str {
        match (self, priority) {
            (WireFormat::Table, p) => p.as_str(),
            (_, TaskPriority::Low) => "LOW",
            (_, TaskPriority::Medium) => "MEDIUM",
            (_, TaskPriority::High) => "HIGH",
        }
    }

    fn assignee(self, obj: &Map<String, Value>) -> Option<String> {
        let raw = match self {
            WireFormat::Employee => obj
                .get("employee_info")
                .and_then(|e| e.get("full_name"))
                .and_then(Value::as_str),
            _ => obj.get("assignee").and_then(Value::as_str),
        };
        raw.filter(|s| !s.is_empty()).map(str::to_string)
    }

    pub fn decode_task(self, value: &Value) -> Result<Task> {
        let obj = value
            .as_object()
            .ok_or_else(|| TaskError::Wire(format!("expected task object, got {value}")))?;
        let fields = self.fields();
        let id = match obj.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(TaskError::Wire(format!("task without id: {value}"))),
        };
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let date = |key: &str| obj.get(key).and_then(Value::as_str).and_then(parse_datetime);

        Ok(Task {
            id: TaskId(id),
            title: text(fields.title),
            description: text("description"),
            status: TaskStatus::parse_lenient(&text(fields.status)),
            priority: TaskPriority::parse_lenient(&text(fields.priority)),
            assignee: self.assignee(obj),
            deadline: date(fields.deadline),
            created_at: date("created_at"),
            updated_at: date("updated_at"),
            completed_at: date("completed_at"),
        })
    }

    /// Accepts a bare array or a paginated `{"results": [...]}` envelope.
    pub fn decode_list(self, value: &Value) -> Result<Vec<Task>> {
        let items = value
            .as_array()
            .or_else(|| value.get("results").and_then(Value::as_array))
            .ok_or_else(|| TaskError::Wire(format!("expected a task list, got {value}")))?;
        items.iter().map(|item| self.decode_task(item)).collect()
    }

    pub fn encode_new(self, task: &NewTask) -> Value {
        let fields = self.fields();
        let mut obj = Map::new();
        obj.insert(fields.title.to_string(), json!(task.title));
        obj.insert("description".to_string(), json!(task.description));
        obj.insert(
            fields.status.to_string(),
            json!(self.encode_status(task.status)),
        );
        obj.insert(
            fields.priority.to_string(),
            json!(self.encode_priority(task.priority)),
        );
        if let Some(assignee) = &task.assignee
            && self != WireFormat::Employee
        {
            obj.insert("assignee".to_string(), json!(assignee));
        }
        if let Some(deadline) = task.deadline {
            obj.insert(fields.deadline.to_string(), json!(deadline.to_rfc3339()));
        }
        Value::Object(obj)
    }

    /// Only fields present in `update` are emitted.
    pub fn encode_update(self, update: &TaskUpdate) -> Value {
        let fields = self.fields();
        let mut obj = Map::new();
        if let Some(title) = &update.title {
            obj.insert(fields.title.to_string(), json!(title));
        }
        if let Some(description) = &update.description {
            obj.insert("description".to_string(), json!(description));
        }
        if let Some(status) = update.status {
            obj.insert(fields.status.to_string(), json!(self.encode_status(status)));
        }
        if let Some(priority) = update.priority {
            obj.insert(
                fields.priority.to_string(),
                json!(self.encode_priority(priority)),
            );
        }
        // The employee shape links assignees by id; names cannot be written back.
        if let Some(assignee) = &update.assignee
            && self != WireFormat::Employee
        {
            obj.insert("assignee".to_string(), json!(assignee));
        }
        if let Some(deadline) = update.deadline {
            obj.insert(fields.deadline.to_string(), json!(deadline.to_rfc3339()));
        }
        if self == WireFormat::Table && !obj.is_empty() {
            obj.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }
        Value::Object(obj)
    }
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates taken as midnight UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_django_row() {
        let row = json!({
            "id": 42,
            "title": "Write report",
            "description": null,
            "status": "IN_PROGRESS",
            "priority": "URGENT",
            "assignee": "Ivanov",
            "due_date": "2025-03-01T12:00:00Z",
            "created_at": "2025-02-01T08:30:00+03:00",
            "updated_at": "2025-02-02T08:30:00Z"
        });

        let task = WireFormat::Django.decode_task(&row).unwrap();

        assert_eq!(task.id, TaskId("42".to_string()));
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.assignee.as_deref(), Some("Ivanov"));
        assert_eq!(
            task.deadline,
            Some(parse_datetime("2025-03-01T12:00:00Z").unwrap())
        );
        assert_eq!(
            task.created_at.map(|d| d.to_rfc3339()),
            Some("2025-02-01T05:30:00+00:00".to_string())
        );
    }

    #[test]
    fn decodes_employee_row() {
        let row = json!({
            "id": 7,
            "task_name": "Order supplies",
            "description": "Paper and toner",
            "comment": "before Friday",
            "task_status": "done",
            "task_priority": "low",
            "deadline": "2025-04-10",
            "employee_info": { "id": 3, "full_name": "Petrova Anna" }
        });

        let task = WireFormat::Employee.decode_task(&row).unwrap();

        assert_eq!(task.title, "Order supplies");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.priority, TaskPriority::Low);
        assert_eq!(task.assignee.as_deref(), Some("Petrova Anna"));
        assert_eq!(
            task.deadline.map(|d| d.to_rfc3339()),
            Some("2025-04-10T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn decodes_table_row_with_string_id() {
        let row = json!({
            "id": "0b5c",
            "title": "Deploy",
            "description": "prod",
            "status": "in-progress",
            "priority": "high",
            "assignee": "",
            "deadline": "2025-05-01T00:00:00Z",
            "completed_at": null
        });

        let task = WireFormat::Table.decode_task(&row).unwrap();

        assert_eq!(task.id, TaskId("0b5c".to_string()));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.assignee, None);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn rejects_rows_without_id() {
        let err = WireFormat::Django
            .decode_task(&json!({"title": "x"}))
            .unwrap_err();
        assert!(matches!(err, TaskError::Wire(_)));
    }

    #[test]
    fn decodes_paginated_list() {
        let page = json!({
            "count": 1,
            "next": null,
            "results": [{ "id": 1, "title": "a", "status": "PENDING", "priority": "LOW" }]
        });

        let tasks = WireFormat::Django.decode_list(&page).unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, TaskPriority::Low);
        assert!(WireFormat::Django.decode_list(&json!({"a": 1})).is_err());
    }

    #[test]
    fn encodes_new_task_per_format() {
        let task = NewTask {
            title: "Write report".to_string(),
            description: "Q1".to_string(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            assignee: Some("Ivanov".to_string()),
            deadline: parse_datetime("2025-03-01T12:00:00Z"),
        };

        assert_eq!(
            WireFormat::Django.encode_new(&task),
            json!({
                "title": "Write report",
                "description": "Q1",
                "status": "IN_PROGRESS",
                "priority": "HIGH",
                "assignee": "Ivanov",
                "due_date": "2025-03-01T12:00:00+00:00"
            })
        );
        assert_eq!(
            WireFormat::Employee.encode_new(&task),
            json!({
                "task_name": "Write report",
                "description": "Q1",
                "task_status": "IN_PROGRESS",
                "task_priority": "HIGH",
                "deadline": "2025-03-01T12:00:00+00:00"
            })
        );
        assert_eq!(
            WireFormat::Table.encode_new(&task),
            json!({
                "title": "Write report",
                "description": "Q1",
                "status": "in-progress",
                "priority": "high",
                "assignee": "Ivanov",
                "deadline": "2025-03-01T12:00:00+00:00"
            })
        );
    }

    #[test]
    fn encodes_only_changed_fields() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..TaskUpdate::default()
        };

        assert_eq!(
            WireFormat::Django.encode_update(&update),
            json!({ "status": "COMPLETED" })
        );

        let table = WireFormat::Table.encode_update(&update);
        assert_eq!(table["status"], json!("completed"));
        assert!(table.get("updated_at").is_some());
        assert_eq!(
            WireFormat::Table.encode_update(&TaskUpdate::default()),
            json!({})
        );
    }

    #[test]
    fn wire_format_names_round_trip() {
        for format in [WireFormat::Django, WireFormat::Employee, WireFormat::Table] {
            assert_eq!(format.to_string().parse::<WireFormat>(), Ok(format));
        }
        assert!("supabase".parse::<WireFormat>().is_err());
    }
}

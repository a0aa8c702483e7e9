use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use chrono::Duration;
use chrono::Utc;

use crate::api::NewTask;
use crate::api::Result;
use crate::api::Task;
use crate::api::TaskBackend;
use crate::api::TaskError;
use crate::api::TaskId;
use crate::api::TaskPriority;
use crate::api::TaskStatus;
use crate::api::TaskUpdate;

#[derive(Default)]
struct MockState {
    tasks: Vec<Task>,
    next_id: u64,
}

/// In-memory task backend for offline use and tests.
#[derive(Default)]
pub struct MockTaskClient {
    state: Mutex<MockState>,
}

impl MockTaskClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend pre-populated with a few sample tasks.
    pub fn seeded() -> Self {
        let client = Self::new();
        let now = Utc::now();
        let rows = [
            ("Update README formatting", TaskStatus::Pending, TaskPriority::Low, 3),
            ("Fix failing login tests", TaskStatus::InProgress, TaskPriority::High, 1),
            ("Add contributing guide", TaskStatus::Completed, TaskPriority::Medium, 7),
        ];
        {
            let mut state = client.lock();
            for (title, status, priority, days) in rows {
                let task = state.insert(NewTask {
                    title: title.to_string(),
                    description: String::new(),
                    status,
                    priority,
                    assignee: None,
                    deadline: Some(now + Duration::days(days)),
                });
                if status == TaskStatus::Completed {
                    let id = task.id.clone();
                    if let Some(task) = state.find_mut(&id) {
                        task.completed_at = Some(now);
                    }
                }
            }
        }
        client
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockState {
    fn insert(&mut self, new: NewTask) -> Task {
        self.next_id += 1;
        let now = Utc::now();
        let task = Task {
            id: TaskId(self.next_id.to_string()),
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            assignee: new.assignee,
            deadline: new.deadline,
            created_at: Some(now),
            updated_at: Some(now),
            completed_at: None,
        };
        self.tasks.push(task.clone());
        task
    }

    fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }
}

#[async_trait::async_trait]
impl TaskBackend for MockTaskClient {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.lock().tasks.clone())
    }

    async fn create_task(&self, task: NewTask) -> Result<Task> {
        Ok(self.lock().insert(task))
    }

    async fn update_task(&self, id: &TaskId, update: TaskUpdate) -> Result<Task> {
        let mut state = self.lock();
        let task = state
            .find_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;
        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(assignee) = update.assignee {
            task.assignee = Some(assignee);
        }
        if let Some(deadline) = update.deadline {
            task.deadline = Some(deadline);
        }
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let mut state = self.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| &t.id != id);
        if state.tasks.len() == before {
            return Err(TaskError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn mark_completed(&self, id: &TaskId) -> Result<()> {
        let mut state = self.lock();
        let task = state
            .find_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;
        let now = Utc::now();
        task.status = TaskStatus::Completed;
        task.completed_at = Some(now);
        task.updated_at = Some(now);
        Ok(())
    }
}

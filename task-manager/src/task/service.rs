use crate::context::RequestContext;
use crate::task::repository::TaskRepository;
use crate::task::{CreateTaskInput, Task, TaskError, TaskStatus, UpdateTaskInput};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Applies the business rules for tasks on top of a [`TaskRepository`].
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `context` - Deadline for the storage call.
    /// * `input` - The validated creation payload.
    ///
    /// # Returns
    ///
    /// The stored task, with a fresh ID, `created_at == updated_at` and the status
    /// defaulted to `TODO` when the input carried none.
    #[tracing::instrument(skip(self, context))]
    pub async fn create_task(
        &self,
        context: &RequestContext,
        input: CreateTaskInput,
    ) -> Result<Task, TaskError> {
        let now = now();
        let task = Task {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or(TaskStatus::Todo),
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };

        self.repository.create(context, &task).await?;
        tracing::info!(task_id = %task.id, "Created task");
        Ok(task)
    }

    #[tracing::instrument(skip(self, context))]
    pub async fn get_task(&self, context: &RequestContext, id: Uuid) -> Result<Task, TaskError> {
        self.repository.get_by_id(context, id).await
    }

    #[tracing::instrument(skip(self, context))]
    pub async fn list_tasks(&self, context: &RequestContext) -> Result<Vec<Task>, TaskError> {
        self.repository.list(context).await
    }

    /// Applies a partial update to an existing task.
    ///
    /// Fields absent from `input` keep their current value. `updated_at` is
    /// refreshed on every call that reaches the store. The read and the write are
    /// separate statements, so a concurrent writer in between is overwritten
    /// (last write wins), while a concurrent delete surfaces as `NotFound`.
    #[tracing::instrument(skip(self, context))]
    pub async fn update_task(
        &self,
        context: &RequestContext,
        id: Uuid,
        input: UpdateTaskInput,
    ) -> Result<Task, TaskError> {
        let mut task = self.repository.get_by_id(context, id).await?;

        input.apply_to(&mut task);
        task.updated_at = now().max(task.updated_at);

        self.repository.update(context, &task).await?;
        tracing::info!(task_id = %task.id, "Updated task");
        Ok(task)
    }

    #[tracing::instrument(skip(self, context))]
    pub async fn delete_task(&self, context: &RequestContext, id: Uuid) -> Result<(), TaskError> {
        self.repository.delete(context, id).await?;
        tracing::info!(task_id = %id, "Deleted task");
        Ok(())
    }
}

// PostgreSQL keeps microseconds, so timestamps are cut to that precision up front.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

use crate::context::RequestContext;
use crate::entities::task;
use crate::task::{Task, TaskError};
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// Persistence operations for tasks.
///
/// Implementations own the `tasks` table and apply no business rules. Every
/// operation that targets a missing row reports [`TaskError::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a fully populated task.
    async fn create(&self, context: &RequestContext, task: &Task) -> Result<(), TaskError>;

    /// Fetches the task with the given ID.
    async fn get_by_id(&self, context: &RequestContext, id: Uuid) -> Result<Task, TaskError>;

    /// Returns every task, newest first.
    async fn list(&self, context: &RequestContext) -> Result<Vec<Task>, TaskError>;

    /// Overwrites the mutable columns of the task with the same ID.
    async fn update(&self, context: &RequestContext, task: &Task) -> Result<(), TaskError>;

    /// Removes the task with the given ID.
    async fn delete(&self, context: &RequestContext, id: Uuid) -> Result<(), TaskError>;
}

/// [`TaskRepository`] backed by a PostgreSQL `tasks` table.
#[derive(Clone, Debug)]
pub struct PostgresTaskRepository {
    db: Arc<DatabaseConnection>,
}

impl PostgresTaskRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    #[tracing::instrument(skip(self, context, task), fields(task_id = %task.id))]
    async fn create(&self, context: &RequestContext, task: &Task) -> Result<(), TaskError> {
        let active_model = task::ActiveModel {
            id: ActiveValue::Set(task.id),
            title: ActiveValue::Set(task.title.clone()),
            description: ActiveValue::Set(task.description.clone()),
            status: ActiveValue::Set(task.status),
            due_date: ActiveValue::Set(task.due_date),
            created_at: ActiveValue::Set(task.created_at),
            updated_at: ActiveValue::Set(task.updated_at),
        };
        context
            .run(task::Entity::insert(active_model).exec_without_returning(self.db.as_ref()))
            .await??;
        Ok(())
    }

    #[tracing::instrument(skip(self, context))]
    async fn get_by_id(&self, context: &RequestContext, id: Uuid) -> Result<Task, TaskError> {
        let model = context
            .run(task::Entity::find_by_id(id).one(self.db.as_ref()))
            .await??
            .ok_or(TaskError::NotFound(id))?;
        Ok(Task::from(model))
    }

    #[tracing::instrument(skip(self, context))]
    async fn list(&self, context: &RequestContext) -> Result<Vec<Task>, TaskError> {
        let tasks = context
            .run(
                task::Entity::find()
                    .order_by_desc(task::Column::CreatedAt)
                    .all(self.db.as_ref()),
            )
            .await??
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self, context, task), fields(task_id = %task.id))]
    async fn update(&self, context: &RequestContext, task: &Task) -> Result<(), TaskError> {
        let changes = task::ActiveModel {
            title: ActiveValue::Set(task.title.clone()),
            description: ActiveValue::Set(task.description.clone()),
            status: ActiveValue::Set(task.status),
            due_date: ActiveValue::Set(task.due_date),
            updated_at: ActiveValue::Set(task.updated_at),
            ..Default::default()
        };
        let result = context
            .run(
                task::Entity::update_many()
                    .set(changes)
                    .filter(task::Column::Id.eq(task.id))
                    .exec(self.db.as_ref()),
            )
            .await??;

        if result.rows_affected == 0 {
            return Err(TaskError::NotFound(task.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, context))]
    async fn delete(&self, context: &RequestContext, id: Uuid) -> Result<(), TaskError> {
        let result = context
            .run(task::Entity::delete_by_id(id).exec(self.db.as_ref()))
            .await??;

        if result.rows_affected == 0 {
            return Err(TaskError::NotFound(id));
        }
        Ok(())
    }
}

//! Task domain types and the error type shared by the repository and service layers.

use crate::context::DeadlineExceeded;
use crate::entities::task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entities::task::TaskStatus;

pub mod api;
pub mod repository;
pub mod service;

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            status: model.status,
            due_date: model.due_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct CreateTaskInput {
    /// Title of the task, must not be empty
    pub title: String,
    /// Free-form description, empty when omitted or `null`
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub description: String,
    /// Initial status, `TODO` when omitted or empty
    #[serde(default, deserialize_with = "deserialize_optional_status")]
    pub status: Option<TaskStatus>,
    /// Optional due date
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Payload for a partial update. Only fields that are present are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct UpdateTaskInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTaskInput {
    /// Overwrites the fields of `task` that are present in this input.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
    }
}

fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// An empty status string means "not provided" on creation.
fn deserialize_optional_status<'de, D>(deserializer: D) -> Result<Option<TaskStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => TaskStatus::deserialize(serde::de::value::StringDeserializer::<D::Error>::new(
            raw,
        ))
        .map(Some),
    }
}

/// Error type for task repository and service operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// No task with this ID exists, either because it never did or because it was removed.
    #[error("Task with ID {0} not found")]
    NotFound(Uuid),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// The request deadline passed before the store answered.
    #[error(transparent)]
    DeadlineExceeded(#[from] DeadlineExceeded),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        Task {
            id: Uuid::new_v4(),
            title: "Buy milk".to_string(),
            description: "Semi-skimmed".to_string(),
            status: TaskStatus::Todo,
            due_date: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn can_deserialize_create_input_with_only_title() {
        let input: CreateTaskInput = serde_json::from_str(r#"{"title":"Buy milk"}"#).unwrap();

        assert_eq!(input.title, "Buy milk");
        assert_eq!(input.description, "");
        assert_eq!(input.status, None);
        assert_eq!(input.due_date, None);
    }

    #[test]
    fn can_treat_null_description_as_empty() {
        let input: CreateTaskInput =
            serde_json::from_str(r#"{"title":"Buy milk","description":null}"#).unwrap();

        assert_eq!(input.title, "Buy milk");
        assert_eq!(input.description, "");
    }

    #[test]
    fn can_treat_empty_status_as_absent() {
        let input: CreateTaskInput =
            serde_json::from_str(r#"{"title":"Buy milk","status":""}"#).unwrap();

        assert_eq!(input.status, None);
    }

    #[test]
    fn can_deserialize_explicit_status() {
        let input: CreateTaskInput =
            serde_json::from_str(r#"{"title":"Buy milk","status":"IN_PROGRESS"}"#).unwrap();

        assert_eq!(input.status, Some(TaskStatus::InProgress));
    }

    #[test]
    fn can_reject_unknown_status() {
        let result =
            serde_json::from_str::<CreateTaskInput>(r#"{"title":"Buy milk","status":"LATER"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn can_reject_create_input_without_title() {
        let result = serde_json::from_str::<CreateTaskInput>(r#"{"description":"nope"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn can_apply_only_present_fields() {
        let mut task = sample_task();
        let original = task.clone();
        let input: UpdateTaskInput = serde_json::from_str(r#"{"status":"DONE"}"#).unwrap();

        input.apply_to(&mut task);

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, original.title);
        assert_eq!(task.description, original.description);
        assert_eq!(task.due_date, original.due_date);
    }

    #[test]
    fn can_distinguish_empty_string_from_absent_field() {
        let mut task = sample_task();
        let input: UpdateTaskInput = serde_json::from_str(r#"{"description":""}"#).unwrap();

        input.apply_to(&mut task);

        assert_eq!(task.description, "");
        assert_eq!(task.title, "Buy milk");
    }

    #[test]
    fn can_set_due_date_through_update() {
        let mut task = sample_task();
        let due = Utc.with_ymd_and_hms(2025, 2, 1, 9, 30, 0).unwrap();
        let input = UpdateTaskInput {
            due_date: Some(due),
            ..Default::default()
        };

        input.apply_to(&mut task);

        assert_eq!(task.due_date, Some(due));
    }
}

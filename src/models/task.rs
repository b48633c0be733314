use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. Required, at most 255 characters.
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    /// An optional free-text description.
    pub description: Option<String>,

    /// Whether the task is completed. Defaults to false.
    #[serde(default)]
    pub completed: bool,
}

/// Partial update for a task. Fields left out retain their prior value.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub completed: Option<bool>,
}

/// A task entity as stored in the database and returned by the API.
///
/// The owning user id is part of the row but never crosses the API boundary.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing, default)]
    pub user_id: i64,
}

const TASK_COLUMNS: &str = "id, title, description, completed, created_at, updated_at, user_id";

// Every query below scopes by `user_id` in its predicate. Ownership is never
// checked by post-fetch filtering, so a task under another owner is
// indistinguishable from one that does not exist.
impl Task {
    /// All tasks owned by `user_id`, ordered by id for deterministic output.
    pub async fn list_for_owner(pool: &PgPool, user_id: i64) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY id",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// The task with `id` owned by `user_id`, or `None`.
    pub async fn find_owned(pool: &PgPool, user_id: i64, id: i64) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Inserts a new task owned by `user_id` and returns the stored row with
    /// its assigned id and timestamps.
    pub async fn insert(pool: &PgPool, user_id: i64, input: &TaskInput) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (title, description, completed, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.completed)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Applies a partial update to the task with `id` owned by `user_id`.
    ///
    /// Omitted fields retain their prior value; `updated_at` is refreshed
    /// unconditionally, even for an empty field set. Returns `None` when no
    /// owned task matches.
    pub async fn update_owned(
        pool: &PgPool,
        user_id: i64,
        id: i64,
        update: &TaskUpdate,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 completed = COALESCE($5, completed),
                 updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.completed)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Permanently removes the task with `id` owned by `user_id`. Returns
    /// true when a row was deleted. A second delete finds nothing.
    pub async fn delete_owned(pool: &PgPool, user_id: i64, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{Task, TaskInput, TaskUpdate},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Retrieves all tasks owned by the authenticated user.
///
/// Results are ordered by id. The list is always scoped to the caller:
/// tasks belonging to other users are never reachable through this endpoint.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects.
/// - `401 Unauthorized`: if the request lacks a valid authentication token.
/// - `500 Internal Server Error`: for database errors.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    log::debug!("listing tasks for user={}", user.username);

    let tasks = Task::list_for_owner(&pool, user.id).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: required, at most 255 characters.
/// - `description` (optional): free text.
/// - `completed` (optional): defaults to false.
///
/// ## Responses:
/// - `201 Created`: the newly created `Task`, with id and timestamps assigned.
/// - `400 Bad Request`: if validation fails (empty or overlong title).
/// - `401 Unauthorized`: if the request lacks a valid authentication token.
/// - `500 Internal Server Error`: for database errors.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    // Validate input
    task_data.validate()?;

    let task = Task::insert(&pool, user.id, &task_data).await?;

    log::info!("task created for user={}; id={}", user.username, task.id);

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// The ownership check is part of the query predicate: a task that exists
/// under another owner is reported exactly like one that does not exist.
///
/// ## Responses:
/// - `200 OK`: the `Task` object.
/// - `401 Unauthorized`: if the request lacks a valid authentication token.
/// - `404 Not Found`: if no task with that id is owned by the caller.
/// - `500 Internal Server Error`: for database errors.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();

    match Task::find_owned(&pool, user.id, id).await? {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Applies a partial update to a task owned by the authenticated user.
///
/// Fields omitted from the body retain their prior value. `updated_at` is
/// refreshed unconditionally on any successful update, even when the body
/// sets no fields at all.
///
/// ## Responses:
/// - `200 OK`: the updated `Task` object.
/// - `400 Bad Request`: if validation fails (empty or overlong title).
/// - `401 Unauthorized`: if the request lacks a valid authentication token.
/// - `404 Not Found`: if no task with that id is owned by the caller.
/// - `500 Internal Server Error`: for database errors.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let id = task_id.into_inner();

    match Task::update_owned(&pool, user.id, id, &task_data).await? {
        Some(task) => {
            log::info!("task updated for user={}; id={}", user.username, id);
            Ok(HttpResponse::Ok().json(task))
        }
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes a task owned by the authenticated user.
///
/// Deletion is permanent and not idempotent: a second delete of the same id
/// fails with 404.
///
/// ## Responses:
/// - `204 No Content`: on successful deletion.
/// - `401 Unauthorized`: if the request lacks a valid authentication token.
/// - `404 Not Found`: if no task with that id is owned by the caller.
/// - `500 Internal Server Error`: for database errors.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();

    if !Task::delete_owned(&pool, user.id, id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }

    log::info!("task deleted for user={}; id={}", user.username, id);

    Ok(HttpResponse::NoContent().finish())
}

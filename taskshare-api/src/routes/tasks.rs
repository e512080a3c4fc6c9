//! Task endpoints
//!
//! # Endpoints
//!
//! - `POST /tasks` - Create a task owned by the caller
//! - `GET /tasks` - Tasks the caller owns, followed by tasks shared with them
//! - `GET /tasks/:id` - Read a task (owner or any grant)
//! - `PUT /tasks/:id` - Replace title/description, optionally set `completed`
//!   (owner or edit grant)
//! - `DELETE /tasks/:id` - Delete a task (owner only)
//!
//! Writes are conditional in the store: a grant revoked after the access
//! check no longer lets the write through.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use taskshare_shared::{
    auth::{
        authorization::{check_task_access, AccessError, Operation},
        middleware::AuthContext,
    },
    models::task::{CreateTask, Task, UpdateTask},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Create task request
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// Update task request
///
/// `title` and `description` replace the stored values; `completed` is only
/// written when present.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub completed: Option<bool>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: Some(req.title),
            description: Some(req.description),
            completed: req.completed,
        }
    }
}

/// Error to report when a conditional write matched nothing
///
/// Re-runs the access check against current state so the caller sees the
/// accurate 404 or 403.
async fn refused_write(state: &AppState, auth: &AuthContext, id: i64, op: Operation) -> ApiError {
    match check_task_access(state.store.as_ref(), auth.user_id, id, op).await {
        Err(e) => e.into(),
        Ok(_) => AccessError::Forbidden(op).into(),
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state
        .store
        .create_task(CreateTask {
            title: req.title,
            description: req.description,
            owner_id: auth.user_id,
        })
        .await?;

    tracing::info!(task_id = task.id, owner_id = task.owner_id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// Owned tasks first, then shared ones; no de-duplication
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Task>>> {
    let mut tasks = state.store.list_tasks_owned_by(auth.user_id).await?;
    tasks.extend(state.store.list_tasks_shared_with(auth.user_id).await?);

    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = check_task_access(state.store.as_ref(), auth.user_id, id, Operation::View).await?;
    Ok(Json(task))
}

/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: Caller is neither owner nor holds an edit grant
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    check_task_access(state.store.as_ref(), auth.user_id, id, Operation::Edit).await?;

    match state
        .store
        .update_task_as_editor(id, auth.user_id, req.into())
        .await?
    {
        Some(task) => {
            tracing::info!(task_id = id, editor_id = auth.user_id, "Task updated");
            Ok(Json(task))
        }
        None => Err(refused_write(&state, &auth, id, Operation::Edit).await),
    }
}

/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: Caller is not the owner
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    check_task_access(state.store.as_ref(), auth.user_id, id, Operation::Delete).await?;

    match state.store.delete_task_as_owner(id, auth.user_id).await? {
        Some(_) => {
            tracing::info!(task_id = id, owner_id = auth.user_id, "Task deleted");
            Ok(Json(json!({ "message": "Task deleted" })))
        }
        None => Err(refused_write(&state, &auth, id, Operation::Delete).await),
    }
}

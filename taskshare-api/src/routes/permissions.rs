//! Permission endpoints
//!
//! # Endpoints
//!
//! - `POST /permissions` - Grant a user access to a task (task owner only)
//! - `DELETE /permissions/:id` - Revoke a grant (task owner only)
//!
//! Granting again to the same user replaces `can_edit` on the existing grant.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use taskshare_shared::{
    auth::{
        authorization::{
            check_revoke_access, check_task_access, AccessError, Operation, Resource,
        },
        middleware::AuthContext,
    },
    models::permission::{CreatePermission, Permission},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Grant request
#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub task_id: i64,
    pub user_id: i64,

    #[serde(default)]
    pub can_edit: bool,
}

/// # Errors
///
/// - `404 Not Found`: No such task or no such grantee
/// - `403 Forbidden`: Caller does not own the task
/// - `400 Bad Request`: Grantee is the task owner
pub async fn create_permission(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<Permission>)> {
    let task = check_task_access(
        state.store.as_ref(),
        auth.user_id,
        req.task_id,
        Operation::Grant,
    )
    .await?;

    if req.user_id == task.owner_id {
        return Err(ApiError::BadRequest(
            "The task owner already has full access".to_string(),
        ));
    }

    if state.store.find_user_by_id(req.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let created = state
        .store
        .create_permission_as_owner(
            auth.user_id,
            CreatePermission {
                task_id: req.task_id,
                user_id: req.user_id,
                can_edit: req.can_edit,
            },
        )
        .await?;

    match created {
        Some(permission) => {
            tracing::info!(
                permission_id = permission.id,
                task_id = permission.task_id,
                user_id = permission.user_id,
                can_edit = permission.can_edit,
                "Permission granted"
            );
            Ok((StatusCode::CREATED, Json(permission)))
        }
        None => {
            let recheck = check_task_access(
                state.store.as_ref(),
                auth.user_id,
                req.task_id,
                Operation::Grant,
            )
            .await;
            Err(match recheck {
                Err(e) => e.into(),
                Ok(_) => AccessError::Forbidden(Operation::Grant).into(),
            })
        }
    }
}

/// # Errors
///
/// - `404 Not Found`: No such permission
/// - `403 Forbidden`: Caller does not own the permission's task
pub async fn delete_permission(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let permission = check_revoke_access(state.store.as_ref(), auth.user_id, id).await?;

    if state
        .store
        .delete_permission_as_owner(id, auth.user_id)
        .await?
    {
        tracing::info!(
            permission_id = id,
            task_id = permission.task_id,
            "Permission revoked"
        );
        return Ok(Json(json!({ "message": "Permission revoked" })));
    }

    // Removed since the check
    Err(
        match check_revoke_access(state.store.as_ref(), auth.user_id, id).await {
            Err(e) => e.into(),
            Ok(_) => AccessError::NotFound(Resource::Permission).into(),
        },
    )
}

//! Access control for tasks and permissions
//!
//! # Permission Model
//!
//! Every task has one owner. Other users reach a task only through a
//! [`Permission`] grant:
//!
//! | Operation | Allowed when |
//! |-----------|--------------|
//! | `View`    | task exists and requester is the owner or holds any grant |
//! | `Edit`    | task exists and requester is the owner or holds a grant with `can_edit` |
//! | `Delete`  | task exists and requester is the owner |
//! | `Grant`   | task exists and requester is the owner |
//! | `Revoke`  | permission exists and requester owns its task |
//!
//! A missing task or permission is [`AccessError::NotFound`]; an existing one
//! the requester may not act on is [`AccessError::Forbidden`]. `Delete`,
//! `Grant` and `Revoke` look at ownership only, so a non-owner deleting an
//! existing task is refused with `Forbidden` whether or not they can see it.
//!
//! [`authorize`] is the pure decision. [`check_task_access`] and
//! [`check_revoke_access`] load what the decision needs from a store.
//!
//! # Example
//!
//! ```
//! use taskshare_shared::auth::authorization::{authorize, AccessError, Operation};
//! use taskshare_shared::models::{permission::Permission, task::Task};
//!
//! let task = Task {
//!     id: 1,
//!     title: "Report".to_string(),
//!     description: String::new(),
//!     completed: false,
//!     owner_id: 10,
//! };
//! let read_only = Permission { id: 5, task_id: 1, user_id: 20, can_edit: false };
//!
//! assert!(authorize(20, Operation::View, Some(&task), Some(&read_only)).is_ok());
//! assert_eq!(
//!     authorize(20, Operation::Edit, Some(&task), Some(&read_only)),
//!     Err(AccessError::Forbidden(Operation::Edit)),
//! );
//! ```

use std::fmt;

use crate::models::{permission::Permission, task::Task};
use crate::store::{PermissionStore, StoreError, TaskStore};

/// Operation a user attempts on a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read the task
    View,

    /// Change title, description or completion
    Edit,

    /// Remove the task
    Delete,

    /// Create a permission on the task
    Grant,

    /// Remove a permission from the task
    Revoke,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::View => "view",
            Operation::Edit => "edit",
            Operation::Delete => "delete",
            Operation::Grant => "grant",
            Operation::Revoke => "revoke",
        }
    }

    /// Whether only the owner may perform this operation
    pub fn is_owner_only(&self) -> bool {
        matches!(self, Operation::Delete | Operation::Grant | Operation::Revoke)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of resource an access check is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Task,
    Permission,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Task => f.write_str("Task"),
            Resource::Permission => f.write_str("Permission"),
        }
    }
}

/// Denied access decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The target does not exist
    #[error("{0} not found")]
    NotFound(Resource),

    /// The target exists but the requester may not perform the operation
    #[error("Not permitted to {0} this task")]
    Forbidden(Operation),
}

/// Error from an access check that had to load data
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error(transparent)]
    Denied(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Decides whether `requester` may perform `operation`
///
/// # Arguments
///
/// * `requester` - ID of the authenticated user
/// * `operation` - Attempted operation
/// * `task` - Target task (`None` if it does not exist). For `Revoke`, the
///   task the permission belongs to.
/// * `permission` - For `View`/`Edit`, the requester's grant on the task, if
///   any. For `Revoke`, the permission being removed (`None` if it does not
///   exist). Ignored for `Delete`/`Grant`.
///
/// A grant only counts for `View`/`Edit` if it names both the requester and
/// the task.
pub fn authorize(
    requester: i64,
    operation: Operation,
    task: Option<&Task>,
    permission: Option<&Permission>,
) -> Result<(), AccessError> {
    match operation {
        Operation::View | Operation::Edit => {
            let task = task.ok_or(AccessError::NotFound(Resource::Task))?;
            if task.is_owned_by(requester) {
                return Ok(());
            }

            let grant = permission.filter(|p| p.task_id == task.id && p.user_id == requester);
            match (operation, grant) {
                (Operation::View, Some(_)) => Ok(()),
                (Operation::Edit, Some(grant)) if grant.can_edit => Ok(()),
                _ => Err(AccessError::Forbidden(operation)),
            }
        }
        Operation::Delete | Operation::Grant => {
            let task = task.ok_or(AccessError::NotFound(Resource::Task))?;
            if task.is_owned_by(requester) {
                Ok(())
            } else {
                Err(AccessError::Forbidden(operation))
            }
        }
        Operation::Revoke => {
            let permission = permission.ok_or(AccessError::NotFound(Resource::Permission))?;
            // An orphaned permission has no owner, so nobody may revoke it here
            match task {
                Some(task) if task.id == permission.task_id && task.is_owned_by(requester) => {
                    Ok(())
                }
                _ => Err(AccessError::Forbidden(operation)),
            }
        }
    }
}

/// Whether deciding `operation` on `task` requires the requester's grant
pub fn needs_grant(requester: i64, operation: Operation, task: &Task) -> bool {
    !operation.is_owner_only() && !task.is_owned_by(requester)
}

/// Loads a task and checks `operation` against it
///
/// The requester's grant is only fetched when ownership alone does not
/// decide. `Revoke` is not a task operation; use [`check_revoke_access`].
///
/// # Returns
///
/// The task the decision was made on
///
/// # Example
///
/// ```no_run
/// # use taskshare_shared::auth::authorization::{check_task_access, Operation};
/// # use taskshare_shared::store::memory::MemoryStore;
/// # async fn example(store: MemoryStore, user_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let task = check_task_access(&store, user_id, 42, Operation::View).await?;
/// println!("{}", task.title);
/// # Ok(())
/// # }
/// ```
pub async fn check_task_access<S>(
    store: &S,
    requester: i64,
    task_id: i64,
    operation: Operation,
) -> Result<Task, AuthzError>
where
    S: TaskStore + PermissionStore + ?Sized,
{
    debug_assert!(operation != Operation::Revoke);

    let task = store.find_task(task_id).await?;
    let grant = match &task {
        Some(task) if needs_grant(requester, operation, task) => {
            store.find_permission(task.id, requester).await?
        }
        _ => None,
    };

    authorize(requester, operation, task.as_ref(), grant.as_ref())?;

    // authorize() rejects a missing task for every task operation
    task.ok_or(AuthzError::Denied(AccessError::NotFound(Resource::Task)))
}

/// Loads a permission and its task and checks that `requester` may revoke it
pub async fn check_revoke_access<S>(
    store: &S,
    requester: i64,
    permission_id: i64,
) -> Result<Permission, AuthzError>
where
    S: TaskStore + PermissionStore + ?Sized,
{
    let permission = store
        .find_permission_by_id(permission_id)
        .await?
        .ok_or(AccessError::NotFound(Resource::Permission))?;

    let task = store.find_task(permission.task_id).await?;
    authorize(requester, Operation::Revoke, task.as_ref(), Some(&permission))?;

    Ok(permission)
}

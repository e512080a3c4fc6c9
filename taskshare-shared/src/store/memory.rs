//! In-memory store
//!
//! Keeps every table behind one `RwLock`, so each trait method is atomic with
//! respect to every other. Enforces the same rules as the PostgreSQL schema:
//! unique usernames, existing foreign keys, one grant per `(task, user)` and
//! cascading permission removal on task delete.
//!
//! Backs the unit and integration test suites.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, PermissionStore, Store, StoreError, StoreResult, TaskStore};
use crate::auth::authorization::{authorize, Operation};
use crate::models::{
    permission::{CreatePermission, Permission},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, User},
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    permissions: BTreeMap<i64, Permission>,
    last_user_id: i64,
    last_task_id: i64,
    last_permission_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    /// Lowest-id grant for the pair, matching the SQL `ORDER BY id LIMIT 1`
    fn grant(&self, task_id: i64, user_id: i64) -> Option<&Permission> {
        self.permissions
            .values()
            .find(|p| p.task_id == task_id && p.user_id == user_id)
    }

    fn upsert_permission(&mut self, data: CreatePermission) -> StoreResult<Permission> {
        if !self.tasks.contains_key(&data.task_id) {
            return Err(StoreError::MissingReference(format!(
                "task {} does not exist",
                data.task_id
            )));
        }
        if !self.users.contains_key(&data.user_id) {
            return Err(StoreError::MissingReference(format!(
                "user {} does not exist",
                data.user_id
            )));
        }

        if let Some(id) = self.grant(data.task_id, data.user_id).map(|p| p.id) {
            if let Some(existing) = self.permissions.get_mut(&id) {
                existing.can_edit = data.can_edit;
                return Ok(existing.clone());
            }
        }

        let permission = Permission {
            id: Self::next_id(&mut self.last_permission_id),
            task_id: data.task_id,
            user_id: data.user_id,
            can_edit: data.can_edit,
        };
        self.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    fn update_task(&mut self, id: i64, changes: &UpdateTask) -> Option<Task> {
        let task = self.tasks.get_mut(&id)?;
        changes.apply_to(task);
        Some(task.clone())
    }

    fn delete_task(&mut self, id: i64) -> Option<Task> {
        let task = self.tasks.remove(&id)?;
        self.permissions.retain(|_, p| p.task_id != id);
        Some(task)
    }
}

/// Store implementation held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                data.username
            )));
        }

        let user = User {
            id: Tables::next_id(&mut tables.last_user_id),
            username: data.username,
            password_digest: data.password_digest,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&data.owner_id) {
            return Err(StoreError::MissingReference(format!(
                "user {} does not exist",
                data.owner_id
            )));
        }

        let task = Task {
            id: Tables::next_id(&mut tables.last_task_id),
            title: data.title,
            description: data.description,
            completed: false,
            owner_id: data.owner_id,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: i64, changes: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(self.tables.write().await.update_task(id, &changes))
    }

    async fn update_task_as_editor(
        &self,
        id: i64,
        editor_id: i64,
        changes: UpdateTask,
    ) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        let allowed = authorize(
            editor_id,
            Operation::Edit,
            tables.tasks.get(&id),
            tables.grant(id, editor_id),
        )
        .is_ok();

        if !allowed {
            return Ok(None);
        }
        Ok(tables.update_task(id, &changes))
    }

    async fn delete_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(self.tables.write().await.delete_task(id))
    }

    async fn delete_task_as_owner(&self, id: i64, owner_id: i64) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        if authorize(owner_id, Operation::Delete, tables.tasks.get(&id), None).is_err() {
            return Ok(None);
        }
        Ok(tables.delete_task(id))
    }

    async fn list_tasks_owned_by(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_tasks_shared_with(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .permissions
            .values()
            .filter(|p| p.user_id == user_id)
            .filter_map(|p| tables.tasks.get(&p.task_id))
            .cloned()
            .collect();

        // Same order as the SQL backend
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn find_permission(
        &self,
        task_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Permission>> {
        Ok(self.tables.read().await.grant(task_id, user_id).cloned())
    }

    async fn find_permission_by_id(&self, id: i64) -> StoreResult<Option<Permission>> {
        Ok(self.tables.read().await.permissions.get(&id).cloned())
    }

    async fn create_permission(&self, data: CreatePermission) -> StoreResult<Permission> {
        self.tables.write().await.upsert_permission(data)
    }

    async fn create_permission_as_owner(
        &self,
        owner_id: i64,
        data: CreatePermission,
    ) -> StoreResult<Option<Permission>> {
        let mut tables = self.tables.write().await;
        if authorize(owner_id, Operation::Grant, tables.tasks.get(&data.task_id), None).is_err() {
            return Ok(None);
        }
        tables.upsert_permission(data).map(Some)
    }

    async fn delete_permission(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.permissions.remove(&id).is_some())
    }

    async fn delete_permission_as_owner(&self, id: i64, owner_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let permission = tables.permissions.get(&id);
        let task = permission.and_then(|p| tables.tasks.get(&p.task_id));
        if authorize(owner_id, Operation::Revoke, task, permission).is_err() {
            return Ok(false);
        }
        Ok(tables.permissions.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(CreateUser {
                username: name.to_string(),
                password_digest: "digest".to_string(),
            })
            .await
            .unwrap()
    }

    async fn task(store: &MemoryStore, owner: &User, title: &str) -> Task {
        store
            .create_task(CreateTask {
                title: title.to_string(),
                description: String::new(),
                owner_id: owner.id,
            })
            .await
            .unwrap()
    }

    fn grant(task: &Task, user: &User, can_edit: bool) -> CreatePermission {
        CreatePermission {
            task_id: task.id,
            user_id: user.id,
            can_edit,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        user(&store, "alice").await;

        let result = store
            .create_user(CreateUser {
                username: "alice".to_string(),
                password_digest: "other".to_string(),
            })
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_lookups_work() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        assert_eq!((alice.id, bob.id), (1, 2));

        assert_eq!(store.find_user_by_username("bob").await.unwrap(), Some(bob));
        assert_eq!(store.find_user_by_username("Bob").await.unwrap(), None);
        assert_eq!(store.find_user_by_id(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_new_task_is_incomplete() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let created = task(&store, &alice, "Write report").await;

        assert!(!created.completed);
        assert_eq!(created.owner_id, alice.id);
        assert_eq!(store.find_task(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_task_for_unknown_owner_is_rejected() {
        let store = MemoryStore::new();
        let result = store
            .create_task(CreateTask {
                title: "Orphan".to_string(),
                description: String::new(),
                owner_id: 7,
            })
            .await;
        assert!(matches!(result, Err(StoreError::MissingReference(_))));
    }

    #[tokio::test]
    async fn test_repeated_grant_updates_existing_row() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let t = task(&store, &alice, "Shared").await;

        let first = store.create_permission(grant(&t, &bob, false)).await.unwrap();
        let second = store.create_permission(grant(&t, &bob, true)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.can_edit);
        assert_eq!(store.find_permission(t.id, bob.id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_grant_requires_existing_user() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let t = task(&store, &alice, "Shared").await;

        let result = store
            .create_permission(CreatePermission {
                task_id: t.id,
                user_id: 42,
                can_edit: false,
            })
            .await;
        assert!(matches!(result, Err(StoreError::MissingReference(_))));
    }

    #[tokio::test]
    async fn test_shared_listing_follows_grants() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let t1 = task(&store, &alice, "One").await;
        task(&store, &alice, "Two").await;
        let t3 = task(&store, &alice, "Three").await;

        store.create_permission(grant(&t3, &bob, false)).await.unwrap();
        store.create_permission(grant(&t1, &bob, true)).await.unwrap();

        let shared = store.list_tasks_shared_with(bob.id).await.unwrap();
        let ids: Vec<i64> = shared.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t1.id, t3.id]);

        assert_eq!(store.list_tasks_owned_by(alice.id).await.unwrap().len(), 3);
        assert!(store.list_tasks_owned_by(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_task_cascades_to_permissions() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let t = task(&store, &alice, "Doomed").await;
        let p = store.create_permission(grant(&t, &bob, true)).await.unwrap();

        assert!(store.delete_task(t.id).await.unwrap().is_some());
        assert_eq!(store.find_permission_by_id(p.id).await.unwrap(), None);
        assert!(store.list_tasks_shared_with(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_as_editor_respects_grants() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let carol = user(&store, "carol").await;
        let t = task(&store, &alice, "Draft").await;
        store.create_permission(grant(&t, &bob, true)).await.unwrap();
        store.create_permission(grant(&t, &carol, false)).await.unwrap();

        let changes = UpdateTask {
            title: Some("Edited".to_string()),
            ..UpdateTask::default()
        };

        let updated = store
            .update_task_as_editor(t.id, bob.id, changes.clone())
            .await
            .unwrap();
        assert_eq!(updated.map(|t| t.title), Some("Edited".to_string()));

        assert!(store
            .update_task_as_editor(t.id, carol.id, changes.clone())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .update_task_as_editor(999, alice.id, changes)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let t = store
            .create_task(CreateTask {
                title: "Draft".to_string(),
                description: "notes".to_string(),
                owner_id: alice.id,
            })
            .await
            .unwrap();

        let updated = store
            .update_task(
                t.id,
                UpdateTask {
                    completed: Some(true),
                    ..UpdateTask::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.description, "notes");
        assert!(updated.completed);
        assert_eq!(updated.owner_id, alice.id);
        assert_eq!(store.find_task(t.id).await.unwrap(), Some(updated));

        assert!(store
            .update_task(999, UpdateTask::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_permission_reports_removal() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let t = task(&store, &alice, "Shared").await;
        let p = store.create_permission(grant(&t, &bob, false)).await.unwrap();

        assert!(store.delete_permission(p.id).await.unwrap());
        assert!(!store.delete_permission(p.id).await.unwrap());
        assert_eq!(store.find_permission(t.id, bob.id).await.unwrap(), None);
        assert!(store.list_tasks_shared_with(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_owner_only_writes() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let t = task(&store, &alice, "Mine").await;

        assert!(store
            .create_permission_as_owner(bob.id, grant(&t, &bob, true))
            .await
            .unwrap()
            .is_none());
        let p = store
            .create_permission_as_owner(alice.id, grant(&t, &bob, true))
            .await
            .unwrap()
            .unwrap();

        assert!(!store.delete_permission_as_owner(p.id, bob.id).await.unwrap());
        assert!(store.delete_task_as_owner(t.id, bob.id).await.unwrap().is_none());

        assert!(store.delete_permission_as_owner(p.id, alice.id).await.unwrap());
        assert!(!store.delete_permission_as_owner(p.id, alice.id).await.unwrap());
        assert!(store.delete_task_as_owner(t.id, alice.id).await.unwrap().is_some());
    }
}

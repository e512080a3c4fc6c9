//! Account registration and password login

use crate::models::user::{CreateUser, User};
use crate::store::{CredentialStore, StoreError};

use super::password::{PasswordError, PasswordService};

/// Error from registration or login
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates an account, storing only the password digest
///
/// # Errors
///
/// `StoreError::Conflict` (wrapped) if the username is taken
pub async fn register<S>(
    store: &S,
    passwords: &PasswordService,
    username: &str,
    password: &str,
) -> Result<User, CredentialError>
where
    S: CredentialStore + ?Sized,
{
    let password_digest = passwords.hash(password)?;

    let user = store
        .create_user(CreateUser {
            username: username.to_string(),
            password_digest,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Checks a username/password pair
///
/// # Returns
///
/// The user if the pair is valid, `None` for an unknown username or a wrong
/// password. Callers should not tell the two apart in responses.
pub async fn authenticate<S>(
    store: &S,
    passwords: &PasswordService,
    username: &str,
    password: &str,
) -> Result<Option<User>, CredentialError>
where
    S: CredentialStore + ?Sized,
{
    let Some(user) = store.find_user_by_username(username).await? else {
        tracing::debug!(username, "Login for unknown username");
        return Ok(None);
    };

    if passwords.verify(password, &user.password_digest)? {
        Ok(Some(user))
    } else {
        tracing::debug!(user_id = user.id, "Login with wrong password");
        Ok(None)
    }
}

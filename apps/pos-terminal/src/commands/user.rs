//! # User Commands
//!
//! Back-office user management. The backend answers these endpoints to
//! admins only; the terminal refuses other roles before asking.

use farma_api::PosBackend;
use farma_core::{UserAccount, UserDraft};
use tracing::info;

use crate::error::AppResult;
use crate::router::Route;
use crate::state::AppState;

fn require_admin(state: &AppState) -> AppResult<()> {
    Route::Usuarios.authorize(state.session.user())
}

/// All users, sorted by name.
pub async fn list_users(state: &AppState, backend: &dyn PosBackend) -> AppResult<Vec<UserAccount>> {
    require_admin(state)?;
    let mut users = backend.list_users().await?;
    users.sort_by_key(|u| u.name.to_lowercase());
    Ok(users)
}

pub async fn get_user(state: &AppState, backend: &dyn PosBackend, id: &str) -> AppResult<UserAccount> {
    require_admin(state)?;
    Ok(backend.get_user(id).await?)
}

pub async fn create_user(
    state: &AppState,
    backend: &dyn PosBackend,
    draft: &UserDraft,
) -> AppResult<UserAccount> {
    require_admin(state)?;
    let user = backend.create_user(draft).await?;
    info!(user_id = %user.id, role = %user.role, "User created");
    Ok(user)
}

/// Saves the edit and reloads the account.
pub async fn update_user(
    state: &AppState,
    backend: &dyn PosBackend,
    id: &str,
    draft: &UserDraft,
) -> AppResult<UserAccount> {
    require_admin(state)?;
    backend.update_user(id, draft).await?;
    info!(user_id = %id, password_changed = draft.password.is_some(), "User updated");
    Ok(backend.get_user(id).await?)
}

pub async fn delete_user(state: &AppState, backend: &dyn PosBackend, id: &str) -> AppResult<()> {
    require_admin(state)?;
    backend.delete_user(id).await?;
    info!(user_id = %id, "User deleted");
    Ok(())
}

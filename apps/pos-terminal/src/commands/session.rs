//! # Session Commands
//!
//! Login, logout and the startup session probe. The backend keeps the
//! session in a cookie; the terminal only mirrors who is logged in.

use farma_api::PosBackend;
use farma_core::{Credentials, UserInfo};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::router::Route;
use crate::state::AppState;

/// Asks the backend who is logged in.
///
/// Runs once at startup. A backend that cannot be reached leaves the
/// terminal anonymous instead of failing startup.
pub async fn probe(state: &mut AppState, backend: &dyn PosBackend) -> Option<UserInfo> {
    match backend.session().await {
        Ok(user) => {
            debug!(logged_in = user.is_some(), "Session probe");
            state.session.set_user(user.clone());
            user
        }
        Err(e) => {
            warn!(error = %e, "Session probe failed");
            None
        }
    }
}

/// Logs in and records the user.
///
/// ## Returns
/// The user the backend reported, with its role resolved
pub async fn login(
    state: &mut AppState,
    backend: &dyn PosBackend,
    credentials: Credentials,
) -> AppResult<UserInfo> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(AppError::validation("User and password are required"));
    }

    let user = backend.login(&credentials).await?;
    info!(user = %user.name, role = %user.role, "Logged in");
    state.session.set_user(Some(user.clone()));
    Ok(user)
}

/// Ends the session and returns to the login view.
///
/// The local session is dropped even when the backend call fails, so a
/// dead backend never traps the operator logged in.
pub async fn logout(state: &mut AppState, backend: &dyn PosBackend) -> AppResult<()> {
    let result = backend.logout().await;

    if let Some(user) = state.session.user() {
        info!(user = %user.name, "Logged out");
    }
    state.session.set_user(None);
    state.reset_to(Route::Login);

    result.map_err(AppError::from)
}

pub fn whoami(state: &AppState) -> AppResult<UserInfo> {
    state
        .session
        .user()
        .cloned()
        .ok_or_else(AppError::session_required)
}

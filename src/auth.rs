use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{SessionIdentity, User};
use crate::AppState;

const USER_ID_KEY: &str = "user_id";

/// Logged-in user. Rejects anonymous requests with a redirect to `/login`.
pub struct AuthUser(pub User);

/// Logged-in user, if any.
pub struct CurrentUser(pub Option<User>);

async fn session_user(parts: &mut Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let session = Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!(msg)))?;

    let Some(user_id) = session.get::<i64>(USER_ID_KEY).await? else {
        return Ok(None);
    };

    let user = state.store.user_by_id(user_id).await?;
    if user.is_none() {
        tracing::warn!(user_id, "session refers to a missing user");
    }
    Ok(user.filter(|u| u.is_authenticated()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_user(parts, state)
            .await?
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(session_user(parts, state).await?))
    }
}

/// Bind the session to `user` under a fresh session id.
pub async fn login_user(session: &Session, user: &impl SessionIdentity) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.session_id()).await
}

/// Drop the user binding and retire the old session id.
pub async fn logout_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<i64>(USER_ID_KEY).await?;
    session.cycle_id().await
}

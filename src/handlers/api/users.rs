use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::auth::{hash_password, verify_password};
use crate::database::models::NewUser;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::Session;

const MIN_PASSWORD_LEN: usize = 8;
const LOGIN_FAILED: &str = "Incorrect email or password, please try again";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/users - sign up and start a session
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> Result<Response, ApiError> {
    validate_signup(&input)?;

    let hashed = hash_password(&input.password)?;
    let user = match state
        .store
        .create_user(input.name.trim(), input.email.trim(), &hashed)
        .await
    {
        Ok(user) => user,
        Err(StoreError::Duplicate(_)) => {
            return Err(ApiError::conflict("An account with this email already exists"))
        }
        Err(e) => return Err(e.into()),
    };

    let cookie = start_session(&state, user.id).await?;
    tracing::info!("User {} signed up", user.id);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(user),
    )
        .into_response())
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = match state.store.find_user_by_email(input.email.trim()).await? {
        Some(user) if verify_password(&input.password, &user.password) => user,
        _ => {
            tracing::warn!("Failed login attempt for {}", input.email);
            return Err(ApiError::bad_request(LOGIN_FAILED));
        }
    };

    let cookie = start_session(&state, user.id).await?;
    tracing::info!("User {} logged in", user.id);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(json!({ "user": user, "message": "You are now logged in!" })),
    )
        .into_response())
}

/// POST /api/users/logout - destroys the stored session; 204 and a cleared
/// cookie, or 404 without a session
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, ApiError> {
    let Some(id) = session.id.as_deref().filter(|_| session.logged_in) else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    state.store.destroy_session(id).await?;
    tracing::info!("Session {} ended", id);

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, state.sessions.expired_cookie())]),
    )
        .into_response())
}

/// Sign a session for `user_id`, record it, and return the `Set-Cookie` value
async fn start_session(state: &AppState, user_id: i64) -> Result<String, ApiError> {
    let issued = state.sessions.issue(user_id)?;
    state
        .store
        .create_session(&issued.id, user_id, issued.expires_at)
        .await?;
    Ok(state.sessions.cookie(&issued.token))
}

fn validate_signup(input: &NewUser) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let email = input.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(ApiError::bad_request("A valid email address is required")),
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn signup_validation() {
        assert!(validate_signup(&signup("Ada", "ada@example.com", "password1")).is_ok());
        assert!(validate_signup(&signup(" ", "ada@example.com", "password1")).is_err());
        assert!(validate_signup(&signup("Ada", "ada.example.com", "password1")).is_err());
        assert!(validate_signup(&signup("Ada", "ada@localhost", "password1")).is_err());
        assert!(validate_signup(&signup("Ada", "ada@example.com", "short")).is_err());
    }
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::auth::session::{clear_cookie, session_cookie, token_from_headers};
use crate::auth::AuthUser;
use crate::db::{RepositoryError, User};
use crate::error::AppError;
use crate::state::AppState;
use crate::workflow::Role;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    name: String,
    email: String,
    password: String,
    role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    email: String,
    password: String,
    role: Option<String>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::Validation(e.body_text()))
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = body(payload)?;

    if [&req.name, &req.email, &req.password, &req.role]
        .iter()
        .any(|f| f.trim().is_empty())
    {
        return Err(AppError::Validation("Missing fields".to_string()));
    }

    let role: Role = req
        .role
        .parse()
        .map_err(|_| AppError::Validation(format!("Unknown role {:?}", req.role)))?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Validation("User exists".to_string()));
    }

    let hash = hash_password(&req.password).await?;
    let user = User::new(&req.name, &req.email, hash, role);

    match state.users.insert(&user).await {
        Ok(()) => {}
        // Lost a race with a concurrent signup for the same email.
        Err(RepositoryError::Duplicate(_)) => {
            return Err(AppError::Validation("User exists".to_string()))
        }
        Err(e) => return Err(e.into()),
    }

    info!("Registered {} as {}", user.email, user.role);
    Ok(Json(json!({ "success": true })))
}

fn login_failed() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Invalid credentials" })),
    )
        .into_response()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = body(payload)?;

    let requested_role = match req.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => return Ok(login_failed()),
        },
    };

    let Some(user) = state.users.find_by_email(&req.email).await? else {
        verify_dummy(&req.password).await?;
        return Ok(login_failed());
    };

    if !verify_password(&req.password, &user.password_hash).await? {
        info!("Failed login for {}", user.email);
        return Ok(login_failed());
    }

    if requested_role.is_some_and(|role| role != user.role) {
        return Ok(login_failed());
    }

    let token = state.sessions.create(&user).await;
    info!("{} logged in as {}", user.email, user.role);

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, state.sessions.ttl()))],
        Json(json!({ "success": true, "role": user.role })),
    )
        .into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = token_from_headers(&headers) {
        state.sessions.destroy(&token).await;
    }

    (
        [(header::SET_COOKIE, clear_cookie())],
        Json(json!({ "success": true })),
    )
}

pub async fn me(user: AuthUser) -> impl IntoResponse {
    Json(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
    }))
}

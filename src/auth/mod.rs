//! Authentication and the role gate.
//!
//! Handlers take an [`AuthUser`] argument to require a live session; the
//! extractor rejects with `401` before the handler runs. Role checks are
//! explicit via [`AuthUser::require`].

pub mod password;
pub mod session;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::User;
use crate::error::AppError;
use crate::state::AppState;
use crate::workflow::Role;

pub use session::SessionStore;

/// The caller behind the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Access gate: `Forbidden` unless the caller holds `role`.
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        require_role(self.role, role)
    }
}

pub fn require_role(actual: Role, required: Role) -> Result<(), AppError> {
    if actual == required {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("{} role required", required)))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session::token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = state
            .sessions
            .get(&token)
            .await
            .ok_or(AppError::Unauthorized)?;

        Ok(Self {
            id: session.user_id,
            name: session.name,
            email: session.email,
            role: session.role,
        })
    }
}

const DEMO_USERS: &[(&str, &str, Role)] = &[
    ("Student One", "student@test.com", Role::Student),
    ("Reviewer One", "reviewer@test.com", Role::Reviewer),
    ("Admin One", "admin@test.com", Role::Admin),
];

const DEMO_PASSWORD: &str = "1234";

/// Create one account per role for local testing. Existing accounts are
/// left untouched, so this is safe to run on every start.
pub async fn seed_demo_users(state: &AppState) -> Result<usize, AppError> {
    let mut created = 0;
    for (name, email, role) in DEMO_USERS {
        if state.users.find_by_email(email).await?.is_some() {
            continue;
        }
        let hash = password::hash_password(DEMO_PASSWORD).await?;
        state
            .users
            .insert(&User::new(name, email, hash, *role))
            .await?;
        created += 1;
    }
    if created > 0 {
        tracing::info!("Seeded {} demo users (password {:?})", created, DEMO_PASSWORD);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_seed_demo_users_is_idempotent() {
        let state = AppState::in_memory(Config::default()).unwrap();
        assert_eq!(seed_demo_users(&state).await.unwrap(), 3);
        assert_eq!(seed_demo_users(&state).await.unwrap(), 0);

        let admin = state.users.find_by_email("admin@test.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(password::verify_password("1234", &admin.password_hash).await.unwrap());
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(Role::Admin, Role::Admin).is_ok());
        let err = require_role(Role::Student, Role::Reviewer).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "reviewer role required");
    }
}

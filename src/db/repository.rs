//! Repository traits for users and documents.
//!
//! Handlers only ever see `Arc<dyn UserRepository>` and
//! `Arc<dyn DocumentRepository>`; the in-memory and Postgres backends are
//! interchangeable behind them.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::{Document, GrammarAnnotation, User};
use crate::workflow::view::ViewFilter;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} already exists")]
    Duplicate(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `Duplicate` if the email is taken.
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    /// Look up by normalised email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn insert(&self, doc: &Document) -> Result<(), RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<Document>, RepositoryError>;

    /// Documents matching `filter`, newest first.
    async fn list(&self, filter: ViewFilter) -> Result<Vec<Document>, RepositoryError>;

    /// Persist the workflow fields (status, comment, comment_by) of `doc`.
    ///
    /// Other columns are left alone so a concurrent grammar annotation
    /// is not overwritten.
    async fn save_transition(&self, doc: &Document) -> Result<(), RepositoryError>;

    /// Record a grammar annotation without touching workflow fields.
    async fn set_grammar(
        &self,
        id: Uuid,
        annotation: &GrammarAnnotation,
    ) -> Result<(), RepositoryError>;
}

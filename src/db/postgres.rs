use async_trait::async_trait;
use uuid::Uuid;

use super::models::{DocumentRow, UserRow};
use super::{
    normalize_email, DbPool, Document, DocumentRepository, GrammarAnnotation, RepositoryError,
    User, UserRepository,
};
use crate::workflow::view::ViewFilter;

const DOCUMENT_COLUMNS: &str = "id, owner_id, filename, storage_path, status, comment, comment_by, \
     created_at, grammar_issues, grammar_error, grammar_checked_at";

fn map_unique(err: sqlx::Error, what: String) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Duplicate(what),
        _ => RepositoryError::Database(err),
    }
}

pub struct PgUsers {
    pool: DbPool,
}

impl PgUsers {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUsers {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_unique(e, format!("user {}", user.email)))?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(User::try_from)
            .transpose()
    }
}

pub struct PgDocuments {
    pool: DbPool,
}

impl PgDocuments {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocuments {
    async fn insert(&self, doc: &Document) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, owner_id, filename, storage_path, status, comment, comment_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(doc.id)
        .bind(doc.owner_id)
        .bind(&doc.filename)
        .bind(&doc.storage_path)
        .bind(doc.status.as_str())
        .bind(&doc.comment)
        .bind(doc.comment_by.map(|r| r.as_str()))
        .bind(doc.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_unique(e, format!("document {}", doc.id)))?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>, RepositoryError> {
        let sql = format!("SELECT {} FROM documents WHERE id = $1", DOCUMENT_COLUMNS);
        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Document::try_from)
            .transpose()
    }

    async fn list(&self, filter: ViewFilter) -> Result<Vec<Document>, RepositoryError> {
        let rows = match filter {
            ViewFilter::Owner(owner_id) => {
                let sql = format!(
                    "SELECT {} FROM documents WHERE owner_id = $1 ORDER BY created_at DESC, id",
                    DOCUMENT_COLUMNS
                );
                sqlx::query_as::<_, DocumentRow>(&sql)
                    .bind(owner_id)
                    .fetch_all(self.pool.as_ref())
                    .await?
            }
            ViewFilter::Status(status) => {
                let sql = format!(
                    "SELECT {} FROM documents WHERE status = $1 ORDER BY created_at DESC, id",
                    DOCUMENT_COLUMNS
                );
                sqlx::query_as::<_, DocumentRow>(&sql)
                    .bind(status.as_str())
                    .fetch_all(self.pool.as_ref())
                    .await?
            }
        };

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn save_transition(&self, doc: &Document) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = $2, comment = $3, comment_by = $4
            WHERE id = $1
            "#,
        )
        .bind(doc.id)
        .bind(doc.status.as_str())
        .bind(&doc.comment)
        .bind(doc.comment_by.map(|r| r.as_str()))
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("document {}", doc.id)));
        }
        Ok(())
    }

    async fn set_grammar(
        &self,
        id: Uuid,
        annotation: &GrammarAnnotation,
    ) -> Result<(), RepositoryError> {
        let issues = annotation.issues.map(|n| i32::try_from(n).unwrap_or(i32::MAX));
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET grammar_issues = $2, grammar_error = $3, grammar_checked_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(issues)
        .bind(&annotation.error)
        .bind(annotation.checked_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("document {}", id)));
        }
        Ok(())
    }
}

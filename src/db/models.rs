use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::RepositoryError;
use crate::workflow::{Role, Status};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never sent to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

/// Emails are unique after trimming and lower-casing.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Result of a best-effort grammar check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarAnnotation {
    pub issues: Option<u32>,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub status: Status,
    pub comment: Option<String>,
    pub comment_by: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub grammar: Option<GrammarAnnotation>,
}

impl Document {
    /// A freshly uploaded document awaiting reviewer triage.
    pub fn submitted(owner_id: Uuid, filename: &str, storage_path: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            filename: filename.to_string(),
            storage_path: storage_path.to_string(),
            status: Status::Submitted,
            comment: None,
            comment_by: None,
            created_at: Utc::now(),
            grammar: None,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepositoryError::Corrupt(format!("user {}: {}", row.id, e)))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct DocumentRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub status: String,
    pub comment: Option<String>,
    pub comment_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub grammar_issues: Option<i32>,
    pub grammar_error: Option<String>,
    pub grammar_checked_at: Option<DateTime<Utc>>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = RepositoryError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: crate::workflow::UnknownVariant| {
            RepositoryError::Corrupt(format!("document {}: {}", id, e))
        };
        let status = row.status.parse::<Status>().map_err(corrupt)?;
        let comment_by = row
            .comment_by
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(corrupt)?;
        let grammar = row.grammar_checked_at.map(|checked_at| GrammarAnnotation {
            issues: row.grammar_issues.and_then(|n| u32::try_from(n).ok()),
            error: row.grammar_error,
            checked_at,
        });

        Ok(Self {
            id,
            owner_id: row.owner_id,
            filename: row.filename,
            storage_path: row.storage_path,
            status,
            comment: row.comment,
            comment_by,
            created_at: row.created_at,
            grammar,
        })
    }
}

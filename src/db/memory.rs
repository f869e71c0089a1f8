//! In-memory repositories.
//!
//! Used when no `DATABASE_URL` is configured and by the test suite. All
//! records are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    normalize_email, Document, DocumentRepository, GrammarAnnotation, RepositoryError, User,
    UserRepository,
};
use crate::workflow::view::{select, ViewFilter};

#[derive(Default)]
pub struct InMemoryUsers {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate(format!("user {}", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryDocuments {
    docs: RwLock<HashMap<Uuid, Document>>,
}

impl InMemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocuments {
    async fn insert(&self, doc: &Document) -> Result<(), RepositoryError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&doc.id) {
            return Err(RepositoryError::Duplicate(format!("document {}", doc.id)));
        }
        docs.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>, RepositoryError> {
        Ok(self.docs.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: ViewFilter) -> Result<Vec<Document>, RepositoryError> {
        let docs = self.docs.read().await;
        Ok(select(filter, docs.values()))
    }

    async fn save_transition(&self, doc: &Document) -> Result<(), RepositoryError> {
        let mut docs = self.docs.write().await;
        let stored = docs
            .get_mut(&doc.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("document {}", doc.id)))?;
        stored.status = doc.status;
        stored.comment = doc.comment.clone();
        stored.comment_by = doc.comment_by;
        Ok(())
    }

    async fn set_grammar(
        &self,
        id: Uuid,
        annotation: &GrammarAnnotation,
    ) -> Result<(), RepositoryError> {
        let mut docs = self.docs.write().await;
        let stored = docs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("document {}", id)))?;
        stored.grammar = Some(annotation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Role, Status};
    use chrono::Utc;

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUsers::new();
        repo.insert(&User::new("A", "a@test.com", "h".into(), Role::Student))
            .await
            .unwrap();
        let err = repo
            .insert(&User::new("B", "A@Test.com ", "h".into(), Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));

        let found = repo.find_by_email(" a@TEST.com").await.unwrap().unwrap();
        assert_eq!(found.name, "A");
    }

    #[tokio::test]
    async fn test_save_transition_keeps_grammar() {
        let repo = InMemoryDocuments::new();
        let doc = Document::submitted(Uuid::new_v4(), "a.txt", "uploads/a.txt");
        repo.insert(&doc).await.unwrap();

        let annotation = GrammarAnnotation {
            issues: Some(3),
            error: None,
            checked_at: Utc::now(),
        };
        repo.set_grammar(doc.id, &annotation).await.unwrap();

        // A transition computed from the pre-annotation snapshot.
        let mut moved = doc.clone();
        moved.status = Status::Forwarded;
        repo.save_transition(&moved).await.unwrap();

        let stored = repo.get(doc.id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Forwarded);
        assert_eq!(stored.grammar, Some(annotation));
    }

    #[tokio::test]
    async fn test_list_applies_role_view() {
        let repo = InMemoryDocuments::new();
        let alice = Uuid::new_v4();
        let older = Document::submitted(alice, "old.txt", "uploads/old.txt");
        let mut newer = Document::submitted(alice, "new.txt", "uploads/new.txt");
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        let mut forwarded = Document::submitted(Uuid::new_v4(), "fwd.txt", "uploads/fwd.txt");
        forwarded.status = Status::Forwarded;
        for doc in [&older, &newer, &forwarded] {
            repo.insert(doc).await.unwrap();
        }

        let mine = repo.list(ViewFilter::for_actor(alice, Role::Student)).await.unwrap();
        let names: Vec<_> = mine.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["new.txt", "old.txt"]);

        let queue = repo.list(ViewFilter::for_actor(Uuid::new_v4(), Role::Admin)).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, forwarded.id);
    }

    #[tokio::test]
    async fn test_save_transition_unknown_document() {
        let repo = InMemoryDocuments::new();
        let doc = Document::submitted(Uuid::new_v4(), "a.txt", "uploads/a.txt");
        let err = repo.save_transition(&doc).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }
}

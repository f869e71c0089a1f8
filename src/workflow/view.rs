//! Role-specific document views.

use uuid::Uuid;

use super::{Role, Status};
use crate::db::Document;

/// Which documents a caller may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFilter {
    Owner(Uuid),
    Status(Status),
}

impl ViewFilter {
    pub fn for_actor(user_id: Uuid, role: Role) -> Self {
        match role {
            Role::Student => Self::Owner(user_id),
            Role::Reviewer => Self::Status(Status::Submitted),
            Role::Admin => Self::Status(Status::Forwarded),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Owner(id) => doc.owner_id == *id,
            Self::Status(status) => doc.status == *status,
        }
    }
}

/// Newest first; ties broken by id so repeated listings agree.
fn sort_newest_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// The documents in `docs` that `filter` admits, newest first.
pub fn select<'a, I>(filter: ViewFilter, docs: I) -> Vec<Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut out: Vec<Document> = docs
        .into_iter()
        .filter(|d| filter.matches(d))
        .cloned()
        .collect();
    sort_newest_first(&mut out);
    out
}

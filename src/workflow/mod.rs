//! Document lifecycle state machine.
//!
//! The workflow is a pure function over a [`Document`]: given the acting
//! role and an [`Action`], it either returns the updated document or a
//! [`WorkflowError`] and leaves the input untouched. Persistence and access
//! control happen around it, never inside it.

pub mod view;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::db::Document;

/// Comment recorded when an admin rejects without giving a reason.
pub const DEFAULT_ADMIN_REJECT_COMMENT: &str = "Rejected by admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Reviewer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Reviewer => "reviewer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "reviewer" => Ok(Self::Reviewer),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Workflow state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Submitted,
    Forwarded,
    ReviewerApproved,
    ReviewerRejected,
    AdminApproved,
    AdminRejected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Forwarded => "forwarded",
            Self::ReviewerApproved => "reviewer_approved",
            Self::ReviewerRejected => "reviewer_rejected",
            Self::AdminApproved => "admin_approved",
            Self::AdminRejected => "admin_rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(Self::Submitted),
            "forwarded" => Ok(Self::Forwarded),
            "reviewer_approved" => Ok(Self::ReviewerApproved),
            "reviewer_rejected" => Ok(Self::ReviewerRejected),
            "admin_approved" => Ok(Self::AdminApproved),
            "admin_rejected" => Ok(Self::AdminRejected),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward,
    ReviewerApprove,
    ReviewerReject,
    AdminApprove,
    AdminReject,
}

impl Action {
    /// The only role allowed to perform this action.
    pub fn required_role(&self) -> Role {
        match self {
            Self::Forward | Self::ReviewerApprove | Self::ReviewerReject => Role::Reviewer,
            Self::AdminApprove | Self::AdminReject => Role::Admin,
        }
    }

    /// The only status this action may start from.
    pub fn source_status(&self) -> Status {
        match self {
            Self::Forward | Self::ReviewerApprove | Self::ReviewerReject => Status::Submitted,
            Self::AdminApprove | Self::AdminReject => Status::Forwarded,
        }
    }

    pub fn target_status(&self) -> Status {
        match self {
            Self::Forward => Status::Forwarded,
            Self::ReviewerApprove => Status::ReviewerApproved,
            Self::ReviewerReject => Status::ReviewerRejected,
            Self::AdminApprove => Status::AdminApproved,
            Self::AdminReject => Status::AdminRejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::ReviewerApprove => "reviewer_approve",
            Self::ReviewerReject => "reviewer_reject",
            Self::AdminApprove => "admin_approve",
            Self::AdminReject => "admin_reject",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{role} may not {action}")]
    Forbidden { role: Role, action: Action },

    #[error("cannot {action} a document that is {from}")]
    InvalidTransition { from: Status, action: Action },

    #[error("a comment is required to {action}")]
    MissingComment { action: Action },
}

/// Apply `action` on behalf of `actor` and return the resulting document.
///
/// Role is checked before source state, so a student poking at a forwarded
/// document gets `Forbidden` rather than leaking the document's status.
pub fn apply_action(
    doc: &Document,
    actor: Role,
    action: Action,
    comment: Option<&str>,
) -> Result<Document, WorkflowError> {
    if actor != action.required_role() {
        return Err(WorkflowError::Forbidden {
            role: actor,
            action,
        });
    }

    if doc.status != action.source_status() {
        return Err(WorkflowError::InvalidTransition {
            from: doc.status,
            action,
        });
    }

    let comment = comment.map(str::trim).filter(|c| !c.is_empty());

    let mut next = doc.clone();
    next.status = action.target_status();

    match action {
        Action::Forward | Action::ReviewerApprove | Action::AdminApprove => {
            next.comment = None;
            next.comment_by = None;
        }
        Action::ReviewerReject => {
            let comment = comment.ok_or(WorkflowError::MissingComment { action })?;
            next.comment = Some(comment.to_string());
            next.comment_by = Some(Role::Reviewer);
        }
        Action::AdminReject => {
            let comment = comment.unwrap_or(DEFAULT_ADMIN_REJECT_COMMENT);
            next.comment = Some(comment.to_string());
            next.comment_by = Some(Role::Admin);
        }
    }

    Ok(next)
}

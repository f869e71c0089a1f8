//! docflow: a document review workflow service.
//!
//! Students upload documents, reviewers triage them and admins make the
//! final call. The lifecycle rules live in [`workflow`]; everything else is
//! the HTTP, storage and identity plumbing around it.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod grammar;
pub mod routes;
pub mod state;
pub mod storage;
pub mod workflow;

pub use error::AppError;
pub use state::AppState;

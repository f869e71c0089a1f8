use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::Document;
use crate::error::AppError;
use crate::grammar;
use crate::state::AppState;
use crate::storage::sanitize_filename;
use crate::workflow::{apply_action, view::ViewFilter, Action, Role};

/// Largest comment body read by the reject endpoints.
const MAX_COMMENT_BYTES: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
struct CommentBody {
    #[serde(default)]
    comment: Option<String>,
}

/// Optional reject comment, sent as JSON or as a urlencoded form.
///
/// An empty body carries no comment. A body that is present but cannot be
/// decoded is a `Validation` error, never a silent `None`.
#[derive(Debug, Default)]
pub struct CommentInput(pub Option<String>);

#[async_trait]
impl<S> FromRequest<S> for CommentInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_COMMENT_BYTES)
            .await
            .map_err(|e| AppError::Validation(format!("Unreadable request body: {}", e)))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        let body = match content_type.as_deref() {
            Some("application/x-www-form-urlencoded") => {
                let req = Request::from_parts(parts, Body::from(bytes));
                let Form(body) = Form::<CommentBody>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                body
            }
            // Clients that omit the header still send JSON.
            None | Some("application/json") => {
                let Json(body) = Json::<CommentBody>::from_bytes(&bytes)
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                body
            }
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "Unsupported content type {}",
                    other
                )))
            }
        };

        Ok(Self(body.comment))
    }
}

/// Unparseable ids are reported the same way as unknown ones.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("document {} not found", raw)))
}

pub(crate) async fn load(state: &AppState, id: Uuid) -> Result<Document, AppError> {
    state
        .documents
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("document {} not found", id)))
}

/// Students may only touch their own documents; staff may see any.
pub(crate) fn ensure_can_view(user: &AuthUser, doc: &Document) -> Result<(), AppError> {
    match user.role {
        Role::Student if doc.owner_id != user.id => {
            Err(AppError::Forbidden("not your document".to_string()))
        }
        _ => Ok(()),
    }
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Role::Student)?;
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    let filename = sanitize_filename(&filename)?;

    let handle = state.blobs.put(&filename, &data).await?;
    let doc = Document::submitted(user.id, &filename, &handle);
    state.documents.insert(&doc).await?;

    info!("{} uploaded {} as document {}", user.email, filename, doc.id);

    if state.grammar.is_some() {
        tokio::spawn(grammar::annotate_in_background(state.clone(), doc.clone()));
    }

    Ok(Json(json!({ "success": true, "doc": doc })))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Document>>, AppError> {
    let docs = state
        .documents
        .list(ViewFilter::for_actor(user.id, user.role))
        .await?;
    Ok(Json(docs))
}

async fn transition(
    state: &AppState,
    user: &AuthUser,
    raw_id: &str,
    action: Action,
    comment: Option<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.require(action.required_role())?;

    let id = parse_id(raw_id)?;
    let doc = load(state, id).await?;
    let next = apply_action(&doc, user.role, action, comment.as_deref())?;
    state.documents.save_transition(&next).await?;

    info!(
        "{} applied {} to {}: {} -> {}",
        user.email, action, id, doc.status, next.status
    );
    Ok(Json(json!({ "success": true, "doc": next })))
}

pub async fn forward(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(&state, &user, &id, Action::Forward, None).await
}

pub async fn reviewer_approve(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(&state, &user, &id, Action::ReviewerApprove, None).await
}

pub async fn reviewer_reject(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    CommentInput(comment): CommentInput,
) -> Result<impl IntoResponse, AppError> {
    transition(&state, &user, &id, Action::ReviewerReject, comment).await
}

pub async fn admin_approve(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(&state, &user, &id, Action::AdminApprove, None).await
}

pub async fn admin_reject(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    CommentInput(comment): CommentInput,
) -> Result<impl IntoResponse, AppError> {
    transition(&state, &user, &id, Action::AdminReject, comment).await
}

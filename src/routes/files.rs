use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::documents::{ensure_can_view, load, parse_id};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::grammar::{annotation_from, check_document};
use crate::state::AppState;

pub async fn download_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let doc = load(&state, parse_id(&id)?).await?;
    ensure_can_view(&user, &doc)?;

    let content = state.blobs.get(&doc.storage_path).await?;
    let mime = mime_guess::from_path(&doc.filename)
        .first_raw()
        .unwrap_or("application/octet-stream");
    let disposition = format!(
        "attachment; filename=\"{}\"",
        doc.filename.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    ))
}

/// Re-run the grammar check synchronously and report service failures.
pub async fn grammar_check(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let client = state
        .grammar
        .as_ref()
        .ok_or_else(|| AppError::NotFound("grammar checking is not configured".to_string()))?;

    let mut doc = load(&state, parse_id(&id)?).await?;
    ensure_can_view(&user, &doc)?;

    let result = match check_document(client, state.blobs.as_ref(), &doc).await {
        Ok(Some(issues)) => Ok(issues),
        Ok(None) => {
            return Err(AppError::Validation(format!(
                "grammar checking does not support {}",
                doc.filename
            )))
        }
        Err(e) => Err(e),
    };

    let annotation = annotation_from(&result);
    state.documents.set_grammar(doc.id, &annotation).await?;
    result?;

    doc.grammar = Some(annotation);
    Ok(Json(json!({ "success": true, "doc": doc })))
}

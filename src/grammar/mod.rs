//! Optional grammar annotation for uploaded documents.
//!
//! Text is pulled out of the stored blob and sent to an external checker.
//! The result is attached to the document as a side annotation and never
//! influences its workflow status.

mod client;

pub use client::GrammarClient;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{Document, GrammarAnnotation};
use crate::state::AppState;
use crate::storage::{BlobStore, StorageError};

/// Extracted text shorter than this is treated as empty.
const MIN_TEXT_CHARS: usize = 20;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("grammar service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("grammar service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable grammar service response: {0}")]
    Parse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextKind {
    Pdf,
    Plain,
}

fn text_kind(filename: &str) -> Option<TextKind> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(TextKind::Pdf),
        "txt" | "md" => Some(TextKind::Plain),
        _ => None,
    }
}

pub fn is_supported(filename: &str) -> bool {
    text_kind(filename).is_some()
}

/// Text content of an uploaded file, or `None` for unsupported types.
pub async fn extract_text(filename: &str, data: Vec<u8>) -> Result<Option<String>, GrammarError> {
    let text = match text_kind(filename) {
        None => return Ok(None),
        Some(TextKind::Plain) => String::from_utf8(data)
            .map_err(|e| GrammarError::Extraction(format!("not valid UTF-8: {}", e)))?,
        Some(TextKind::Pdf) => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&data)
                .map_err(|e| GrammarError::Extraction(format!("PDF extraction error: {}", e)))
        })
        .await
        .map_err(|e| GrammarError::Extraction(e.to_string()))??,
    };

    if text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(GrammarError::Extraction(format!(
            "document has insufficient text ({} chars)",
            text.trim().len()
        )));
    }
    Ok(Some(text))
}

/// Run one check for `doc`. `Ok(None)` means the file type is not checked.
pub async fn check_document(
    client: &GrammarClient,
    blobs: &dyn BlobStore,
    doc: &Document,
) -> Result<Option<u32>, GrammarError> {
    if !is_supported(&doc.filename) {
        return Ok(None);
    }
    let data = blobs.get(&doc.storage_path).await?;
    match extract_text(&doc.filename, data).await? {
        Some(text) => Ok(Some(client.check(&text).await?)),
        None => Ok(None),
    }
}

pub fn annotation_from(result: &Result<u32, GrammarError>) -> GrammarAnnotation {
    match result {
        Ok(issues) => GrammarAnnotation {
            issues: Some(*issues),
            error: None,
            checked_at: Utc::now(),
        },
        Err(e) => GrammarAnnotation {
            issues: None,
            error: Some(e.to_string()),
            checked_at: Utc::now(),
        },
    }
}

/// Best-effort check after upload. Failures are recorded on the document
/// and logged, never returned.
pub async fn annotate_in_background(state: std::sync::Arc<AppState>, doc: Document) {
    let Some(client) = state.grammar.as_ref() else {
        return;
    };

    let result = match check_document(client, state.blobs.as_ref(), &doc).await {
        Ok(Some(issues)) => Ok(issues),
        Ok(None) => return,
        Err(e) => Err(e),
    };

    match &result {
        Ok(issues) => info!("Grammar check for {}: {} issues", doc.id, issues),
        Err(e) => warn!("Grammar check for {} failed: {}", doc.id, e),
    }

    let annotation = annotation_from(&result);
    if let Err(e) = state.documents.set_grammar(doc.id, &annotation).await {
        warn!("Failed to record grammar annotation for {}: {}", doc.id, e);
    }
}

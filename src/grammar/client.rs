use reqwest::Client;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::GrammarError;

/// Longest excerpt sent per check. Public LanguageTool instances reject
/// larger payloads.
pub const MAX_CHECK_CHARS: usize = 20_000;

#[derive(Debug, Deserialize)]
struct CheckResponse {
    matches: Vec<IgnoredAny>,
}

/// Client for a LanguageTool-compatible `/v2/check` endpoint.
#[derive(Clone)]
pub struct GrammarClient {
    client: Client,
    url: String,
    language: String,
}

impl GrammarClient {
    pub fn new(url: String, language: String) -> Result<Self, GrammarError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            url,
            language,
        })
    }

    /// Number of issues the service reports for `text`.
    pub async fn check(&self, text: &str) -> Result<u32, GrammarError> {
        let excerpt = truncate_chars(text, MAX_CHECK_CHARS);
        info!("Grammar check ({} bytes, language {})", excerpt.len(), self.language);

        let response = self
            .client
            .post(&self.url)
            .form(&[("text", excerpt), ("language", self.language.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GrammarError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, 200).to_string(),
            });
        }

        parse_issue_count(&body)
    }
}

pub(crate) fn parse_issue_count(body: &str) -> Result<u32, GrammarError> {
    let parsed: CheckResponse =
        serde_json::from_str(body).map_err(|e| GrammarError::Parse(e.to_string()))?;
    Ok(u32::try_from(parsed.matches.len()).unwrap_or(u32::MAX))
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::Error;
use crate::review::{ReviewRecord, SelectedFile};

/// Shown when the service can't be reached at all, or no better cause exists.
pub const UNREACHABLE_MESSAGE: &str =
    "Could not connect to the analysis service or an unknown error occurred.";

/// Anything that can turn a file into a review.
///
/// [`ReviewClient`] is the real implementation; the seam exists so the session
/// can be driven without a network.
pub trait Analyzer: Send + Sync + 'static {
    fn analyze(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = Result<ReviewRecord, Error>> + Send;
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// HTTP client for the analysis service.
///
/// One call is one POST: no retries, no timeout, no caching.
#[derive(Clone)]
pub struct ReviewClient {
    client: Client,
    endpoint: String,
}

impl ReviewClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Use a preconfigured `reqwest::Client` (proxy, TLS or timeout settings).
    pub fn with_client(endpoint: &str, client: Client) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn review(&self, file: &SelectedFile) -> Result<ReviewRecord, Error> {
        let part = multipart::Part::bytes(file.payload.clone())
            .file_name(file.name.clone())
            .mime_str(file.content_type())
            .map_err(|e| Error::Transport(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        debug!(endpoint = %self.endpoint, file = %file.name, bytes = file.payload.len(), "posting file");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, error = %e, "analysis request failed");
                Error::Transport(UNREACHABLE_MESSAGE.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(%status, error = %e, "failed to read analysis response body");
            Error::Transport(UNREACHABLE_MESSAGE.to_string())
        })?;

        if !status.is_success() {
            return Err(Error::Transport(failure_detail(status, &body)));
        }

        ReviewRecord::from_json(&body)
    }
}

impl Analyzer for ReviewClient {
    async fn analyze(&self, file: &SelectedFile) -> Result<ReviewRecord, Error> {
        self.review(file).await
    }
}

/// Pick the user-visible message for a non-success response: the service's
/// `detail` field when there is one, otherwise a generic line with the status.
fn failure_detail(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);

    match detail {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => {
            format!("The analysis service responded with {} and no error detail.", status)
        }
        // FastAPI validation errors put a list of objects here
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string_is_used_verbatim() {
        let msg = failure_detail(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Unsupported file type. Must be one of: .py, .js"}"#,
        );
        assert_eq!(msg, "Unsupported file type. Must be one of: .py, .js");
    }

    #[test]
    fn test_structured_detail_is_serialized() {
        let msg = failure_detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "file"], "msg": "field required"}]}"#,
        );
        assert!(msg.contains("field required"));
    }

    #[test]
    fn test_missing_detail_falls_back() {
        let msg = failure_detail(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(msg.contains("502"));
        assert!(msg.contains("no error detail"));

        let msg = failure_detail(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": "  "}"#);
        assert!(msg.contains("500"));
    }
}

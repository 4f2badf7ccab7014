//! Client for the remote document service.
//!
//! The service owns every DOCX concern. This side only ships the original
//! bytes back and forth:
//!
//! - `POST {base}/extract-text` with a `file` part, answering `{"text": ...}`
//! - `POST {base}/edit-docx` with `file` and `text_map` parts, answering the
//!   patched document bytes
//!
//! Requests have no client-side timeout and are never retried.

use std::time::Duration;

use reqwest::blocking::{Client, Response, multipart};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::document::{DOCX_MIME_TYPE, DocumentFile};
use crate::error::GatewayError;
use crate::text_map::TextMap;

pub const EXTRACT_TEXT_ENDPOINT: &str = "extract-text";
pub const EDIT_DOCX_ENDPOINT: &str = "edit-docx";

pub trait DocumentGateway: Send + Sync + 'static {
    /// Plain text of the document, paragraphs separated by blank lines.
    fn extract_text(&self, document: &DocumentFile) -> Result<String, GatewayError>;

    /// A new document with every paragraph matching a key of `text_map`
    /// replaced by its value.
    fn apply_edits(
        &self,
        document: &DocumentFile,
        text_map: &TextMap,
    ) -> Result<Vec<u8>, GatewayError>;
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: Option<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(GatewayError::Client)?;
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<String, GatewayError> {
        let base = self.base_url.as_deref().ok_or(GatewayError::MissingBaseUrl)?;
        Ok(format!("{base}/{endpoint}"))
    }

    fn file_part(
        endpoint: &'static str,
        document: &DocumentFile,
    ) -> Result<multipart::Part, GatewayError> {
        let mime = if document.content_type().is_empty() {
            DOCX_MIME_TYPE
        } else {
            document.content_type()
        };
        multipart::Part::bytes(document.bytes().to_vec())
            .file_name(document.name().to_string())
            .mime_str(mime)
            .map_err(|source| GatewayError::Transport { endpoint, source })
    }

    fn post(
        &self,
        endpoint: &'static str,
        form: multipart::Form,
    ) -> Result<Response, GatewayError> {
        let url = self.endpoint_url(endpoint)?;
        debug!(%url, "sending request");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().unwrap_or_default();
        warn!(endpoint, status = status.as_u16(), %detail, "document service rejected request");
        Err(GatewayError::Status {
            endpoint,
            status: status.as_u16(),
            detail,
        })
    }
}

impl DocumentGateway for HttpGateway {
    fn extract_text(&self, document: &DocumentFile) -> Result<String, GatewayError> {
        let endpoint = EXTRACT_TEXT_ENDPOINT;
        // Configuration errors win over anything request-shaped.
        self.endpoint_url(endpoint)?;
        let form = multipart::Form::new().part("file", Self::file_part(endpoint, document)?);
        let body = self
            .post(endpoint, form)?
            .text()
            .map_err(|source| GatewayError::Transport { endpoint, source })?;
        let parsed: ExtractResponse = serde_json::from_str(&body)
            .map_err(|source| GatewayError::Decode { endpoint, source })?;
        let text = parsed.text.unwrap_or_default();
        info!(file = document.name(), chars = text.len(), "extracted document text");
        Ok(text)
    }

    fn apply_edits(
        &self,
        document: &DocumentFile,
        text_map: &TextMap,
    ) -> Result<Vec<u8>, GatewayError> {
        let endpoint = EDIT_DOCX_ENDPOINT;
        self.endpoint_url(endpoint)?;
        let text_map_json = text_map.to_json().map_err(GatewayError::Encode)?;
        let form = multipart::Form::new()
            .part("file", Self::file_part(endpoint, document)?)
            .text("text_map", text_map_json);
        let bytes = self
            .post(endpoint, form)?
            .bytes()
            .map_err(|source| GatewayError::Transport { endpoint, source })?;
        info!(
            file = document.name(),
            replacements = text_map.len(),
            size = bytes.len(),
            "received patched document"
        );
        Ok(bytes.to_vec())
    }
}

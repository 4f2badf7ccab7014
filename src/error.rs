use std::path::PathBuf;

use thiserror::Error;

/// Local rejection of a selected file. Never reaches the network.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a valid Word document (.docx)")]
    UnsupportedType { name: String, content_type: String },
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("document service base URL is not configured (set DOCPATCH_API_BASE_URL or --api-base)")]
    MissingBaseUrl,
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}: {detail}")]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: String,
    },
    #[error("{endpoint} returned an unreadable response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not start request worker: {0}")]
    Worker(#[source] std::io::Error),
    #[error("could not encode text map: {0}")]
    Encode(#[source] serde_json::Error),
}

impl GatewayError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, GatewayError::MissingBaseUrl)
    }
}

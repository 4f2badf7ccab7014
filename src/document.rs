use std::{
    fmt, fs,
    path::Path,
    sync::Arc,
};

use tracing::{debug, warn};

use crate::error::UploadError;

pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOCX_EXTENSION: &str = ".docx";
const EDITED_SUFFIX: &str = "_edited.docx";

/// The original uploaded document. Cloning shares the bytes; the contents
/// are never modified after upload.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl DocumentFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Validate the file name, then read the file. Terminal selections carry
    /// no declared content type, so only the extension is checked.
    pub fn open(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        validate_upload(&name, "")?;
        let bytes = fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(file = %name, size = bytes.len(), "read document from disk");
        let document = Self::new(name, String::new(), bytes);
        if document.is_empty() {
            warn!(file = document.name(), "document file is empty");
        }
        Ok(document)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub fn validate_upload(name: &str, content_type: &str) -> Result<(), UploadError> {
    if content_type == DOCX_MIME_TYPE || name.ends_with(DOCX_EXTENSION) {
        return Ok(());
    }
    Err(UploadError::UnsupportedType {
        name: name.to_string(),
        content_type: content_type.to_string(),
    })
}

/// Name for the patched copy: `report.docx` becomes `report_edited.docx`.
pub fn edited_file_name(name: &str) -> String {
    let stem = name.strip_suffix(DOCX_EXTENSION).unwrap_or(name);
    format!("{stem}{EDITED_SUFFIX}")
}

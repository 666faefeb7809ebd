use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::format_bytes;
use crate::http::join_url;

/// File extensions accepted for upload, lowercase and without the dot.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["eml", "msg", "txt"];

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Key prefix uploads are stored under.
pub const OBJECT_PREFIX: &str = "emails";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Rejections made before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported file type: {file_name} (accepted: .eml, .msg, .txt)")]
    UnsupportedExtension { file_name: String },

    #[error("file too large: {} (max {})", human(.size), human(.limit))]
    TooLarge { size: u64, limit: u64 },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload failed: {0}")]
    Transport(#[from] ureq::Error),

    #[error("upload rejected with status {0}")]
    Status(u16),
}

fn human(bytes: &u64) -> String {
    format_bytes(*bytes)
}

/// Checks name and size, returning the file's extension as given.
pub fn validate(file_name: &str, size: u64) -> Result<&str, ValidationError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
        .ok_or_else(|| ValidationError::UnsupportedExtension {
            file_name: file_name.to_string(),
        })?;

    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(extension)
}

/// Identifier the backend's logs mention for an upload made at `epoch_ms`.
pub fn file_id(epoch_ms: i64) -> String {
    format!("email-{}", epoch_ms)
}

pub fn object_key(file_id: &str, extension: &str) -> String {
    format!("{}/{}.{}", OBJECT_PREFIX, file_id, extension)
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "eml" => "message/rfc822",
        "msg" => "application/vnd.ms-outlook",
        "txt" => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Stored file name without extension; use it as the correlation filter.
    pub file_id: String,
    pub object_key: String,
    pub content_type: &'static str,
    pub size: u64,
}

/// Puts email files into the upload bucket.
pub struct Uploader {
    agent: ureq::Agent,
    bucket_url: String,
}

impl Uploader {
    pub fn new(agent: ureq::Agent, bucket_url: impl Into<String>) -> Self {
        Self {
            agent,
            bucket_url: bucket_url.into(),
        }
    }

    /// Validates and uploads a file from disk.
    pub fn upload_file(&self, path: &Path) -> Result<UploadReceipt, UploadError> {
        let display = path.display().to_string();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&display);
        let metadata = std::fs::metadata(path).map_err(|source| UploadError::Read {
            path: display.clone(),
            source,
        })?;
        validate(file_name, metadata.len())?;

        let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
            path: display.clone(),
            source,
        })?;
        self.upload_bytes(file_name, &bytes)
    }

    pub fn upload_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<UploadReceipt, UploadError> {
        let extension = validate(file_name, bytes.len() as u64)?;
        let file_id = file_id(chrono::Utc::now().timestamp_millis());
        let object_key = object_key(&file_id, extension);
        let content_type = content_type_for(extension);
        let url = join_url(&self.bucket_url, &object_key);

        let response = self
            .agent
            .put(&url)
            .config()
            .http_status_as_error(false)
            .build()
            .header("Content-Type", content_type)
            .send(bytes)?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        info!(%object_key, size = bytes.len(), "uploaded email file");
        Ok(UploadReceipt {
            file_id,
            object_key,
            content_type,
            size: bytes.len() as u64,
        })
    }
}

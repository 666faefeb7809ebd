//! Client side of the email supplier-matching backend.
//!
//! The centrepiece is [`StreamSession`], which polls the log gateway for the
//! trailing ten minutes of a log group, merges results into a deduplicated,
//! time-ordered record list and projects it through a correlation filter.
//! Around it sit the upload client ([`Uploader`]), the supplier API client
//! ([`SupplierClient`]) and the [`Config`] that wires them up.

pub mod config;
pub mod error;
pub mod groups;
pub mod http;
pub mod mock_backend;
pub mod records;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod suppliers;
pub mod upload;

pub use config::{Config, Overrides, Readiness};
pub use error::{Error, Result};
pub use groups::{GroupCatalog, LogGroup};
pub use records::{LogRecord, RecordClass};
pub use scheduler::StreamScheduler;
pub use session::{SessionState, StreamSession};
pub use source::{HttpLogSource, LogQuery, LogSource};
pub use suppliers::SupplierClient;
pub use upload::{UploadError, UploadReceipt, Uploader, ValidationError};

/// Format bytes into human-readable units (B, KB, MB, GB, TB).
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.1} {}", size, UNITS[unit_idx])
    }
}

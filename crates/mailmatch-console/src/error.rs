use thiserror::Error;

use crate::upload::UploadError;

/// Errors surfaced by the backend clients and the stream session.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{feature} is not configured (missing {missing})")]
    NotConfigured {
        feature: &'static str,
        missing: String,
    },

    #[error(transparent)]
    Upload(#[from] UploadError),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Configuration for the backend clients.
//!
//! Values come from a TOML file (by default `<config dir>/mailmatch/config.toml`)
//! and are overridden by command-line flags. A missing endpoint does not fail
//! loading; the feature that needs it reports [`Readiness::NotReady`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::groups::DEFAULT_GROUP_PREFIX;
use crate::source::HttpLogSource;
use crate::suppliers::SupplierClient;
use crate::upload::Uploader;

const APP_DIR: &str = "mailmatch";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Config file contents; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub log_api_url: Option<String>,
    pub log_group_prefix: Option<String>,
    pub upload_bucket_url: Option<String>,
    pub supplier_api_url: Option<String>,
    pub api_token: Option<String>,
    pub logging: FileLogging,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

/// Values given on the command line. They win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_api_url: Option<String>,
    pub log_group_prefix: Option<String>,
    pub upload_bucket_url: Option<String>,
    pub supplier_api_url: Option<String>,
    pub api_token: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_api_url: Option<String>,
    pub log_group_prefix: String,
    pub upload_bucket_url: Option<String>,
    pub supplier_api_url: Option<String>,
    pub api_token: Option<String>,
    pub logging: LoggingConfig,
}

/// Whether a feature has what it needs to run.
#[derive(Debug)]
pub enum Readiness<T> {
    Ready(T),
    NotReady {
        feature: &'static str,
        missing: Vec<&'static str>,
    },
}

impl<T> Readiness<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            Readiness::Ready(value) => Ok(value),
            Readiness::NotReady { feature, missing } => Err(Error::NotConfigured {
                feature,
                missing: missing.join(", "),
            }),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads `path`, or the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::read_file(&default)?,
                _ => FileConfig::default(),
            },
        };
        Ok(Self::from_file(file))
    }

    pub fn parse(contents: &str, origin: &str) -> Result<FileConfig> {
        toml::from_str(contents).map_err(|source| Error::ConfigParse {
            path: origin.to_string(),
            source,
        })
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, &path.display().to_string())
    }

    pub fn from_file(file: FileConfig) -> Self {
        Self {
            log_api_url: non_empty(file.log_api_url),
            log_group_prefix: non_empty(file.log_group_prefix)
                .unwrap_or_else(|| DEFAULT_GROUP_PREFIX.to_string()),
            upload_bucket_url: non_empty(file.upload_bucket_url),
            supplier_api_url: non_empty(file.supplier_api_url),
            api_token: non_empty(file.api_token),
            logging: LoggingConfig {
                level: non_empty(file.logging.level)
                    .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                dir: file.logging.dir.unwrap_or_else(default_log_dir),
            },
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(url) = non_empty(overrides.log_api_url) {
            self.log_api_url = Some(url);
        }
        if let Some(prefix) = non_empty(overrides.log_group_prefix) {
            self.log_group_prefix = prefix;
        }
        if let Some(url) = non_empty(overrides.upload_bucket_url) {
            self.upload_bucket_url = Some(url);
        }
        if let Some(url) = non_empty(overrides.supplier_api_url) {
            self.supplier_api_url = Some(url);
        }
        if let Some(token) = non_empty(overrides.api_token) {
            self.api_token = Some(token);
        }
        if let Some(level) = non_empty(overrides.log_level) {
            self.logging.level = level;
        }
        self
    }

    /// Points every endpoint at one base URL, as served by the mock backend.
    pub fn with_backend(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.log_api_url = Some(base.to_string());
        self.upload_bucket_url = Some(format!("{}/bucket", base));
        self.supplier_api_url = Some(base.to_string());
        self
    }

    pub fn log_source(&self, agent: &ureq::Agent) -> Readiness<HttpLogSource> {
        match &self.log_api_url {
            Some(url) => Readiness::Ready(HttpLogSource::new(
                agent.clone(),
                url.clone(),
                self.api_token.clone(),
            )),
            None => Readiness::NotReady {
                feature: "log streaming",
                missing: vec!["log_api_url"],
            },
        }
    }

    pub fn uploader(&self, agent: &ureq::Agent) -> Readiness<Uploader> {
        match &self.upload_bucket_url {
            Some(url) => Readiness::Ready(Uploader::new(agent.clone(), url.clone())),
            None => Readiness::NotReady {
                feature: "upload",
                missing: vec!["upload_bucket_url"],
            },
        }
    }

    pub fn supplier_client(&self, agent: &ureq::Agent) -> Readiness<SupplierClient> {
        match &self.supplier_api_url {
            Some(url) => Readiness::Ready(SupplierClient::new(
                agent.clone(),
                url.clone(),
                self.api_token.clone(),
            )),
            None => Readiness::NotReady {
                feature: "supplier matching",
                missing: vec!["supplier_api_url"],
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(FileConfig::default())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

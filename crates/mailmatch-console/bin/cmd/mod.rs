pub(crate) mod console;
pub(crate) mod groups;
pub(crate) mod logging;
pub(crate) mod mock_backend;
pub(crate) mod suppliers;
pub(crate) mod tail;
pub(crate) mod upload;

use clap::Args;
use colored::Colorize;
use eyre::Result;
use mailmatch_console::{Config, LogRecord, Overrides, Readiness, RecordClass};
use std::path::PathBuf;

/// Flags shared by every subcommand. They override the config file.
#[derive(Debug, Args)]
pub(crate) struct GlobalArgs {
    /// Config file (defaults to <config dir>/mailmatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of a backend serving every API (e.g. the mock backend)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Log gateway base URL
    #[arg(long, global = true)]
    pub log_api_url: Option<String>,

    /// Only list log groups starting with this prefix
    #[arg(long, global = true)]
    pub log_group_prefix: Option<String>,

    /// Upload bucket base URL
    #[arg(long, global = true)]
    pub upload_bucket_url: Option<String>,

    /// Supplier API base URL
    #[arg(long, global = true)]
    pub supplier_api_url: Option<String>,

    /// Bearer token for the log and supplier APIs
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

impl GlobalArgs {
    pub(crate) fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(backend) = &self.backend {
            config = config.with_backend(backend);
        }
        Ok(config.with_overrides(Overrides {
            log_api_url: self.log_api_url.clone(),
            log_group_prefix: self.log_group_prefix.clone(),
            upload_bucket_url: self.upload_bucket_url.clone(),
            supplier_api_url: self.supplier_api_url.clone(),
            api_token: self.api_token.clone(),
            log_level: self.log_level.clone(),
        }))
    }
}

/// Unwraps a ready feature or explains which setting is missing.
pub(crate) fn require<T>(readiness: Readiness<T>) -> Result<T> {
    readiness
        .into_result()
        .map_err(|e| eyre::eyre!("{}. Set it in the config file or pass the matching flag.", e))
}

pub(crate) fn print_record(record: &LogRecord) {
    let time = record.local_time().dimmed();
    let message = match record.class() {
        RecordClass::Error => record.message.red(),
        RecordClass::Warning => record.message.yellow(),
        RecordClass::Info => record.message.cyan(),
        RecordClass::Default => record.message.normal(),
    };
    println!("{} {}", time, message);
}

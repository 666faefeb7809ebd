use clap::Args;
use colored::Colorize;
use eyre::Result;
use mailmatch_console::http::build_agent;
use mailmatch_console::{format_bytes, Config, UploadError};
use std::path::PathBuf;

use super::console::ConsoleArgs;
use super::require;

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Email file to upload
    pub path: PathBuf,

    /// Open the console filtered to this upload's processing logs
    #[arg(long)]
    pub follow: bool,
}

impl UploadArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let agent = build_agent();
        let uploader = require(config.uploader(&agent))?;

        let receipt = match uploader.upload_file(&self.path) {
            Ok(receipt) => receipt,
            Err(UploadError::Validation(e)) => {
                return Err(eyre::eyre!("Rejected {}: {}", self.path.display(), e));
            }
            Err(e) => return Err(e.into()),
        };

        println!(
            "{} {} ({}, {})",
            "Uploaded".green().bold(),
            receipt.object_key,
            format_bytes(receipt.size),
            receipt.content_type
        );
        println!("File id: {}", receipt.file_id.bold());

        if self.follow {
            ConsoleArgs {
                correlation: Some(receipt.file_id),
                stream: true,
            }
            .run(config)?;
        }
        Ok(())
    }
}

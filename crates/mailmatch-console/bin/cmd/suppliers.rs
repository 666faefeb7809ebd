use clap::Args;
use eyre::Result;
use mailmatch_console::http::build_agent;
use mailmatch_console::Config;
use serde_json::Value;

use super::require;

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Request body as JSON
    #[arg(long)]
    pub json: String,
}

#[derive(Debug, Args)]
pub struct MatchesArgs {
    /// File id printed by `upload`
    pub email_id: String,
}

#[derive(Debug, Args)]
pub struct FeedbackArgs {
    /// Feedback body as JSON
    #[arg(long)]
    pub json: String,
}

fn parse_payload(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| eyre::eyre!("--json is not valid JSON: {}", e))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl SuggestArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let payload = parse_payload(&self.json)?;
        let client = require(config.supplier_client(&build_agent()))?;
        print_json(&client.suggest(&payload)?)
    }
}

impl MatchesArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let client = require(config.supplier_client(&build_agent()))?;
        print_json(&client.matches(&self.email_id)?)
    }
}

impl FeedbackArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let payload = parse_payload(&self.json)?;
        let client = require(config.supplier_client(&build_agent()))?;
        print_json(&client.feedback(&payload)?)
    }
}

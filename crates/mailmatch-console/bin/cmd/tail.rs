use clap::Args;
use colored::Colorize;
use eyre::Result;
use mailmatch_console::http::build_agent;
use mailmatch_console::{records, Config, LogGroup, LogSource, StreamSession};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{print_record, require};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);
const LOOP_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Args)]
pub struct TailArgs {
    /// Log group name (defaults to the discovered default group)
    #[arg(long)]
    pub group: Option<String>,

    /// Only print records containing this text
    #[arg(long)]
    pub correlation: Option<String>,

    /// Fetch the last ten minutes once and exit
    #[arg(long)]
    pub once: bool,
}

impl TailArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let agent = build_agent();
        let source = require(config.log_source(&agent))?;
        let mut session = StreamSession::new(Arc::new(source), config.log_group_prefix.clone());
        session.set_correlation(self.correlation.clone());
        session.track_new_records(!self.once);

        match &self.group {
            Some(name) => session.select_group(LogGroup::from_name(name, &config.log_group_prefix)),
            None => {
                session.discover_groups();
                session.wait_for_outcome(CALL_TIMEOUT);
            }
        }
        bail_on_error(&session)?;

        let Some(group) = session.state().selected_group.clone() else {
            let reason = session
                .catalog()
                .diagnostic
                .clone()
                .unwrap_or_else(|| "no log group selected".to_string());
            return Err(eyre::eyre!(reason));
        };
        eprintln!("{} {}", "Tailing".green().bold(), group.id);

        if self.once {
            session.refresh();
            session.wait_for_outcome(CALL_TIMEOUT);
            bail_on_error(&session)?;
            for record in session.projection() {
                print_record(record);
            }
            return Ok(());
        }

        session.start_streaming(Instant::now());
        let mut last_error: Option<String> = None;
        loop {
            session.tick(Instant::now());

            let correlation = session.state().correlation_filter.clone();
            let fresh = session.take_new_records();
            for record in records::project(&fresh, correlation.as_deref()) {
                print_record(record);
            }

            let error = session.state().last_error.clone();
            if error != last_error {
                if let Some(message) = &error {
                    eprintln!("{}", message.red());
                }
                last_error = error;
            }

            std::thread::sleep(LOOP_INTERVAL);
        }
    }
}

fn bail_on_error<S: LogSource>(session: &StreamSession<S>) -> Result<()> {
    match &session.state().last_error {
        Some(message) => Err(eyre::eyre!(message.clone())),
        None => Ok(()),
    }
}

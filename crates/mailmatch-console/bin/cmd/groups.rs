use clap::Args;
use colored::Colorize;
use eyre::Result;
use mailmatch_console::groups::is_relevant;
use mailmatch_console::http::build_agent;
use mailmatch_console::{Config, GroupCatalog, LogSource};
use prettytable::{Cell, Row, Table};

use super::require;

#[derive(Debug, Args)]
pub struct GroupsArgs {
    /// Include groups that do not look related to email processing
    #[arg(long)]
    pub all: bool,
}

impl GroupsArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let agent = build_agent();
        let source = require(config.log_source(&agent))?;
        let catalog = GroupCatalog::from_groups(source.describe_log_groups(&config.log_group_prefix)?);

        if let Some(diagnostic) = &catalog.diagnostic {
            eprintln!("{}", diagnostic.yellow());
        }

        let mut table = Table::new();
        table.set_titles(Row::new(vec![
            Cell::new("Group"),
            Cell::new("Relevant"),
            Cell::new("Default"),
        ]));
        for group in catalog.visible(self.all) {
            let is_default = catalog.selected.as_ref() == Some(group);
            table.add_row(Row::new(vec![
                Cell::new(&group.display_name),
                Cell::new(if is_relevant(group) { "yes" } else { "no" }),
                Cell::new(if is_default { "*" } else { "" }),
            ]));
        }
        table.printstd();

        println!(
            "{} groups, {} relevant",
            catalog.all.len(),
            catalog.relevant.len()
        );
        Ok(())
    }
}

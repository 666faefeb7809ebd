mod cmd;

use clap::{Parser, Subcommand};
use eyre::Result;

use cmd::console::ConsoleArgs;
use cmd::groups::GroupsArgs;
use cmd::mock_backend::MockBackendArgs;
use cmd::suppliers::{FeedbackArgs, MatchesArgs, SuggestArgs};
use cmd::tail::TailArgs;
use cmd::upload::UploadArgs;
use cmd::GlobalArgs;

#[derive(Debug, Parser)]
#[command(
    name = "mailmatch-console",
    version,
    about = "Upload emails to the supplier-matching backend and watch them being processed."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive log console
    Console(ConsoleArgs),
    /// Upload an email file (.eml, .msg, .txt, max 10 MB)
    Upload(UploadArgs),
    /// List log groups
    Groups(GroupsArgs),
    /// Stream log records to stdout
    Tail(TailArgs),
    /// Ask the backend for supplier suggestions
    Suggest(SuggestArgs),
    /// Show supplier matches for an uploaded email
    Matches(MatchesArgs),
    /// Send feedback on a supplier match
    Feedback(FeedbackArgs),
    /// Serve a local mock of the backend
    MockBackend(MockBackendArgs),
}

impl Command {
    /// Commands that take over the terminal log to a file instead of stderr.
    fn uses_tui(&self) -> bool {
        match self {
            Command::Console(_) => true,
            Command::Upload(args) => args.follow,
            _ => false,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.global.load_config()?;

    let _log_guard = if cli.command.uses_tui() {
        cmd::logging::init_file(&config.logging)
    } else {
        cmd::logging::init_stderr(&config.logging);
        None
    };

    match cli.command {
        Command::Console(args) => args.run(&config),
        Command::Upload(args) => args.run(&config),
        Command::Groups(args) => args.run(&config),
        Command::Tail(args) => args.run(&config),
        Command::Suggest(args) => args.run(&config),
        Command::Matches(args) => args.run(&config),
        Command::Feedback(args) => args.run(&config),
        Command::MockBackend(args) => args.run(),
    }
}

use crate::demo::{run_demo, run_directory_check, DemoArgs, DirectoryCheckArgs};
use crate::server;
use care_match::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Care Match",
    about = "Run or demonstrate the assessment-to-provider matching service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect a provider directory export
    Directory {
        #[command(subcommand)]
        command: DirectoryCommand,
    },
    /// Walk seekers through intake, emergency detection, and matching
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum DirectoryCommand {
    /// Parse a provider CSV export and summarize who can be matched
    Check(DirectoryCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Provider directory CSV export; the built-in sample roster is used when omitted
    #[arg(long)]
    pub(crate) providers: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Directory {
            command: DirectoryCommand::Check(args),
        } => run_directory_check(args),
        Command::Demo(args) => run_demo(args),
    }
}

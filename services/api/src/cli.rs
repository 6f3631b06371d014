use crate::demo::{run_demo, run_match, DemoArgs, MatchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ride_match::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Ride Match",
    about = "Serve and exercise the ride passenger matching engine from the command line",
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
    /// Run a single match request against the fixtures and print the JSON response
    Match(MatchArgs),
    /// Walk through rule-only and semantic-requested matching on the bundled sample data
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON file with `rides` and `users` to seed the in-memory stores (defaults to the bundled sample)
    #[arg(long)]
    pub(crate) fixtures: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Match(args) => run_match(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

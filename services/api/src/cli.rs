use crate::demo::{run_demo, run_leaderboard, DemoArgs, LeaderboardArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use storyfest::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Storyfest Ranking Engine",
    about = "Serve and inspect storytelling competition leaderboards from the command line",
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
    /// Print podium, runners-up and voting pool for CSV contest exports
    Leaderboard(LeaderboardArgs),
    /// Run a seeded walkthrough of ranking, voting and view counting
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
    /// Entries CSV used to seed the in-memory store
    #[arg(long, requires = "scores")]
    pub(crate) entries: Option<PathBuf>,
    /// Scores CSV used to seed the in-memory store
    #[arg(long, requires = "entries")]
    pub(crate) scores: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Leaderboard(args) => run_leaderboard(args),
        Command::Demo(args) => run_demo(args),
    }
}

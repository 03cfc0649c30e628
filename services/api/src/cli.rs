use crate::demo::{run_demo, run_tally, DemoArgs, TallyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use label_committee::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Label Committee",
    about = "Run the label committee voting service or tally evaluations from the command line",
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
    /// Aggregate an evaluation CSV export into a voting snapshot
    Tally(TallyArgs),
    /// Walk through a committee vote, decision, and notification relay
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
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Tally(args) => run_tally(args),
        Command::Demo(args) => run_demo(args),
    }
}

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sketch automation workflows and ship them to n8n
#[derive(Parser, Debug)]
#[command(name = "sketchbook", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Turn a prompt into a sketch and print the exported workflow
    Generate {
        /// Description of the automation
        prompt: String,

        /// Answer with a recorded generator payload instead of calling the API
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Deploy the result to n8n after generating
        #[arg(long)]
        deploy: bool,

        /// Pretty-print the workflow document
        #[arg(long)]
        pretty: bool,
    },

    /// Export a sketch (the demo sketch if no input is given)
    Export {
        /// Sketch JSON file with `nodes` and `edges`
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Pretty-print the workflow document
        #[arg(long)]
        pretty: bool,
    },

    /// Export a sketch and deploy it to n8n
    Deploy {
        /// Sketch JSON file with `nodes` and `edges`
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so the workflow document on stdout stays clean
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate {
            prompt,
            replay,
            deploy,
            pretty,
        } => commands::generate(&prompt, replay.as_deref(), deploy, pretty).await,
        Command::Export { input, pretty } => commands::export(input.as_deref(), pretty).await,
        Command::Deploy { input } => commands::deploy(input.as_deref()).await,
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod search;

#[derive(Debug, Parser)]
#[command(name = "shopbot")]
#[command(about = "Find and rank product offers for a text query or a product photo")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the web for offers and print them ranked
    Search {
        /// What to look for, in any language
        #[arg(long, short)]
        query: Option<String>,
        /// Photo of the product (jpeg, png, webp or gif)
        #[arg(long)]
        image: Option<PathBuf>,
        /// Print `{offers, warnings, is_alternative, searched_at}` as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = shopbot_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Search { query, image, json } => {
            search::run_search(&config, query, image.as_deref(), json).await?;
        }
        Commands::Config => println!("{config:#?}"),
    }

    Ok(())
}

mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use winecat_core::SiteId;

#[derive(Debug, Parser)]
#[command(name = "winecat")]
#[command(about = "Harvest wine retail catalogs as JSON lines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the selected sites and print one JSON row per item on stdout.
    Scrape {
        /// Site to scrape; repeat for several. Defaults to every enabled site.
        #[arg(long = "site", value_name = "SITE")]
        sites: Vec<SiteId>,
    },
    /// List the known sites and the roots they resolve to.
    Sites,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = winecat_core::load_app_config()?;

    // stdout carries the JSON rows; diagnostics go to stderr.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let sites_file = scrape::load_sites_file(&config)?;

    match cli.command {
        Commands::Scrape { sites } => {
            let selected = scrape::select_sites(&sites, &sites_file);
            scrape::run_scrape(&config, &sites_file, &selected).await
        }
        Commands::Sites => scrape::list_sites(&sites_file),
    }
}

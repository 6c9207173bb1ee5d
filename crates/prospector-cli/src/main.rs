mod commands;

use clap::{Parser, Subcommand};
use prospector_browser::ScrapeKind;
use prospector_core::BackendKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "prospector-cli")]
#[command(about = "Run prospect research lookups from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Research one prospect with every applicable lookup
    Research {
        /// Backend to research with (`playwright` or `apify`)
        #[arg(long, default_value = "playwright")]
        backend: BackendKind,

        /// Look the prospect up by id in the prospects file instead of
        /// describing it with the flags below
        #[arg(long, conflicts_with_all = ["name", "company", "profile_url", "website"])]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        profile_url: Option<String>,

        #[arg(long)]
        website: Option<String>,
    },
    /// Run a single browser lookup
    Scrape {
        /// One of `linkedin`, `website`, or `search`
        #[arg(long = "type", default_value = "website")]
        kind: ScrapeKind,

        /// URL to load, or the query for a search
        target: String,
    },
    /// Bulk places search on the actor platform
    Places {
        query: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        max_results: Option<u32>,

        /// Keep only places with a website
        #[arg(long)]
        has_website: bool,

        /// Keep only places with at most this many reviews
        #[arg(long)]
        max_reviews: Option<u64>,
    },
    /// Run any actor with a JSON input object
    Actor {
        actor_id: String,

        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Show actor platform configuration and the actor catalog
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = prospector_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Research {
            backend,
            id,
            name,
            company,
            profile_url,
            website,
        } => {
            let prospect = match id {
                Some(id) => commands::load_prospect(&config.prospects_path, &id)?,
                None => commands::adhoc_prospect(name, company, profile_url, website),
            };
            commands::run_research(&config, backend, &prospect).await
        }
        Commands::Scrape { kind, target } => commands::run_scrape(&config, kind, &target).await,
        Commands::Places {
            query,
            location,
            max_results,
            has_website,
            max_reviews,
        } => {
            let query = prospector_core::PlacesQuery {
                query,
                location,
                max_results,
                has_website: has_website.then_some(true),
                max_reviews,
            };
            commands::run_places(&config, &query).await
        }
        Commands::Actor { actor_id, input } => {
            commands::run_actor(&config, &actor_id, &input).await
        }
        Commands::Status => commands::run_status(&config).await,
    }
}

#[cfg(test)]
mod tests;

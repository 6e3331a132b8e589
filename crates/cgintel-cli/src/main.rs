mod pipeline;
mod scrape;

use cgintel_core::RunType;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scrape::ScrapeCommands;

#[derive(Debug, Parser)]
#[command(name = "cgintel-cli")]
#[command(about = "Product intelligence pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Scrape an external catalog into staging
    Scrape {
        #[command(subcommand)]
        command: ScrapeCommands,
    },
    /// Promote unpromoted staging rows into the catalog
    Promote {
        /// Maximum staging rows to promote in this run
        #[arg(long, default_value = "500")]
        limit: i64,
    },
    /// Fill missing prices and images on catalog rows
    Enrich {
        /// What to fill: price, image or all
        #[arg(long, default_value = "all")]
        mode: String,
        /// Maximum rows to scan (capped at 200)
        #[arg(long, default_value = "200")]
        limit: i64,
        /// Report planned changes without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the Shopify import CSV for stocked products
    Export {
        /// Output file; prints to stdout when omitted
        #[arg(long, short)]
        output: Option<std::path::PathBuf>,
    },
    /// Show recent pipeline runs
    Runs {
        /// Only runs of this stage: obf, amazon, promote or enrich
        #[arg(long = "type")]
        run_type: Option<RunType>,
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("cgintel-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = cgintel_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?command, env = %config.env, "running command");

    let pool_config = cgintel_db::PoolConfig::from_app_config(&config);
    let pool = cgintel_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = cgintel_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Scrape { command } => scrape::run_scrape_command(&pool, &config, command).await?,
        Commands::Promote { limit } => pipeline::run_promote(&pool, limit).await?,
        Commands::Enrich {
            mode,
            limit,
            dry_run,
        } => pipeline::run_enrich(&pool, &config, &mode, limit, dry_run).await?,
        Commands::Export { output } => {
            pipeline::run_export(&pool, &config, output.as_deref()).await?;
        }
        Commands::Runs { run_type, limit } => {
            pipeline::run_list_runs(&pool, run_type, limit).await?;
        }
    }

    Ok(())
}

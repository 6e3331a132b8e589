//! `scrape` command handlers.
//!
//! Page and per-record failures do not fail the command; they are printed
//! after the run summary and recorded on the run row.

use clap::Subcommand;
use cgintel_pipeline::{ScrapeReport, ScrapeRequest, ScrapeSource, TriggerSource};

/// Sub-commands available under `scrape`.
#[derive(Debug, Subcommand)]
pub enum ScrapeCommands {
    /// Search Open Beauty Facts by category tag
    Obf {
        /// Pages per category (1-5)
        #[arg(long)]
        pages: Option<u32>,
        /// Category tag such as `en:face-serums`; repeatable. Defaults to the built-in list.
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Leave scraped rows in staging without promoting them
        #[arg(long)]
        no_promote: bool,
    },
    /// Scrape Amazon search result pages
    Amazon {
        /// Pages per query (1-5)
        #[arg(long)]
        pages: Option<u32>,
        /// Search term; repeatable. Defaults to the built-in queries.
        #[arg(long = "query")]
        queries: Vec<String>,
        /// Leave scraped rows in staging without promoting them
        #[arg(long)]
        no_promote: bool,
    },
}

impl ScrapeCommands {
    fn into_request(self) -> (ScrapeSource, ScrapeRequest) {
        match self {
            ScrapeCommands::Obf {
                pages,
                categories,
                no_promote,
            } => (
                ScrapeSource::OpenBeautyFacts,
                ScrapeRequest {
                    pages,
                    targets: categories,
                    promote: !no_promote,
                },
            ),
            ScrapeCommands::Amazon {
                pages,
                queries,
                no_promote,
            } => (
                ScrapeSource::Amazon,
                ScrapeRequest {
                    pages,
                    targets: queries,
                    promote: !no_promote,
                },
            ),
        }
    }
}

pub(crate) async fn run_scrape_command(
    pool: &sqlx::PgPool,
    config: &cgintel_core::AppConfig,
    command: ScrapeCommands,
) -> anyhow::Result<()> {
    let (source, request) = command.into_request();
    let client = cgintel_scraper::ScraperClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build scraper client: {e}"))?;

    let report =
        cgintel_pipeline::run_scrape(pool, &client, config, source, &request, TriggerSource::Cli)
            .await?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &ScrapeReport) {
    println!(
        "{} run {}: {} page(s) fetched, {} collected, {} staged",
        report.source.run_type(),
        report.run_id,
        report.pages_fetched,
        report.collected,
        report.staged
    );
    if let Some(promotion) = &report.promotion {
        println!(
            "promoted: {} created, {} updated, {} failed",
            promotion.created,
            promotion.updated,
            promotion.errors.len()
        );
    }
    for error in &report.errors {
        eprintln!("warning: {error}");
    }
}

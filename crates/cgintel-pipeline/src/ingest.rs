//! Scrape runs: collect from a source, stage every record, optionally
//! promote the batch.

use cgintel_core::{AppConfig, RunType};
use cgintel_scraper::{
    clamp_pages, collect_amazon, collect_obf, AmazonQuery, CollectOutcome, ScraperClient,
    DEFAULT_OBF_CATEGORIES,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::promote::{promote_batch, PromoteSummary};
use crate::runs::{begin_run, finish_run};
use crate::types::TriggerSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeSource {
    OpenBeautyFacts,
    Amazon,
}

impl ScrapeSource {
    #[must_use]
    pub fn run_type(self) -> RunType {
        match self {
            ScrapeSource::OpenBeautyFacts => RunType::Obf,
            ScrapeSource::Amazon => RunType::Amazon,
        }
    }
}

/// Parameters of one scrape run.
#[derive(Debug, Clone, Default)]
pub struct ScrapeRequest {
    /// Pages per category or query, clamped to `1..=5`.
    pub pages: Option<u32>,
    /// OBF category tags or Amazon search terms; empty means the defaults.
    pub targets: Vec<String>,
    pub promote: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub run_id: i64,
    pub source: ScrapeSource,
    pub pages: u32,
    pub pages_fetched: u32,
    pub collected: usize,
    pub staged: usize,
    pub promotion: Option<PromoteSummary>,
    /// Page failures and per-record staging failures.
    pub errors: Vec<String>,
}

/// Runs one scrape end to end and records it in `collection_runs`.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the run row cannot be created or
/// completed. Page and per-record failures are reported in
/// [`ScrapeReport::errors`] instead.
pub async fn run_scrape(
    pool: &PgPool,
    client: &ScraperClient,
    config: &AppConfig,
    source: ScrapeSource,
    request: &ScrapeRequest,
    trigger: TriggerSource,
) -> Result<ScrapeReport, PipelineError> {
    let pages = clamp_pages(request.pages);
    let targets: Vec<String> = request
        .targets
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let run_type = source.run_type();
    let run_id = begin_run(pool, run_type, trigger).await?;

    let outcome: CollectOutcome = match source {
        ScrapeSource::OpenBeautyFacts => {
            let categories = if targets.is_empty() {
                DEFAULT_OBF_CATEGORIES.iter().map(|c| (*c).to_string()).collect()
            } else {
                targets
            };
            collect_obf(client, &config.obf_base_url, &categories, pages).await
        }
        ScrapeSource::Amazon => {
            let queries = if targets.is_empty() {
                AmazonQuery::defaults()
            } else {
                targets.iter().map(|q| AmazonQuery::from_query(q)).collect()
            };
            collect_amazon(client, &config.amazon_base_url, &queries, pages).await
        }
    };

    let mut errors = outcome.errors;
    let mut staged = Vec::with_capacity(outcome.records.len());
    for record in &outcome.records {
        match cgintel_db::upsert_staging_record(pool, record).await {
            Ok(()) => staged.push(record.clone()),
            Err(e) => {
                tracing::warn!(product_hash = %record.product_hash, error = %e, "staging upsert failed");
                errors.push(format!("stage {}: {e}", record.product_hash));
            }
        }
    }

    let promotion = if request.promote {
        let summary = promote_batch(pool, &staged).await;
        errors.extend(summary.errors.iter().map(|e| format!("promote {e}")));
        Some(summary)
    } else {
        None
    };

    finish_run(pool, run_id, run_type, staged.len(), &errors).await?;

    Ok(ScrapeReport {
        run_id,
        source,
        pages,
        pages_fetched: outcome.pages_fetched,
        collected: outcome.records.len(),
        staged: staged.len(),
        promotion,
        errors,
    })
}

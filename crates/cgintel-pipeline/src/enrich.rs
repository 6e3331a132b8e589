//! Enrichment sweep: fills missing retail prices and images on catalog rows.

use std::str::FromStr;

use cgintel_core::{tier_default_price, CatalogFields, PriceTier, RunType};
use cgintel_db::{CatalogProductRow, DbError};
use cgintel_scraper::{search_image, ImageHit, ScraperClient};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::runs::{begin_run, fail_run_best_effort, finish_run};
use crate::types::{ItemError, TriggerSource};

/// Largest batch a single sweep may touch; also the default.
pub const MAX_ENRICH_LIMIT: i64 = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichMode {
    Price,
    Image,
    #[default]
    All,
}

impl EnrichMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrichMode::Price => "price",
            EnrichMode::Image => "image",
            EnrichMode::All => "all",
        }
    }

    fn wants_price(self) -> bool {
        matches!(self, EnrichMode::Price | EnrichMode::All)
    }

    fn wants_image(self) -> bool {
        matches!(self, EnrichMode::Image | EnrichMode::All)
    }
}

impl FromStr for EnrichMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(EnrichMode::Price),
            "image" => Ok(EnrichMode::Image),
            "all" => Ok(EnrichMode::All),
            other => Err(PipelineError::Validation(format!(
                "mode must be one of price, image, all (got '{other}')"
            ))),
        }
    }
}

/// Clamps a requested batch size into `1..=MAX_ENRICH_LIMIT`.
#[must_use]
pub fn clamp_enrich_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(MAX_ENRICH_LIMIT)
        .clamp(1, MAX_ENRICH_LIMIT)
}

#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    pub mode: EnrichMode,
    pub limit: i64,
    pub dry_run: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            mode: EnrichMode::All,
            limit: MAX_ENRICH_LIMIT,
            dry_run: false,
        }
    }
}

/// Values the sweep fills on one row. Unset fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedChange {
    pub product_hash: String,
    pub display_name: String,
    pub retail_price: Option<Decimal>,
    pub image_url: Option<String>,
    /// Product page the image was taken from.
    pub image_source_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichReport {
    /// `None` for dry runs, which are not recorded.
    pub run_id: Option<i64>,
    pub mode: EnrichMode,
    pub dry_run: bool,
    pub scanned: usize,
    pub updated: usize,
    pub planned: Vec<PlannedChange>,
    pub errors: Vec<ItemError>,
}

/// Tier default price for a row without a retail price. Rows without a tier
/// are priced as `mid`.
///
/// # Errors
///
/// Returns [`DbError::InvalidStoredValue`] if the stored tier is not a known
/// tier.
pub fn plan_price(row: &CatalogProductRow) -> Result<Option<Decimal>, DbError> {
    if row.retail_price.is_some() {
        return Ok(None);
    }
    let tier = row.tier()?.unwrap_or(PriceTier::Mid);
    Ok(Some(tier_default_price(tier)))
}

/// Runs one enrichment sweep over the rows missing a price or an image.
///
/// With `dry_run` the planned changes are returned and nothing is written,
/// including the run audit row.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the candidate query or the run
/// bookkeeping fails. Per-row failures are reported in the report.
pub async fn run_enrichment(
    pool: &PgPool,
    client: &ScraperClient,
    obf_base_url: &str,
    options: EnrichOptions,
    trigger: TriggerSource,
) -> Result<EnrichReport, PipelineError> {
    let limit = clamp_enrich_limit(Some(options.limit));
    let run_id = if options.dry_run {
        None
    } else {
        Some(begin_run(pool, RunType::Enrich, trigger).await?)
    };

    let candidates = match cgintel_db::list_enrichment_candidates(pool, limit).await {
        Ok(rows) => rows,
        Err(e) => {
            if let Some(id) = run_id {
                fail_run_best_effort(pool, id, RunType::Enrich, format!("{e:#}")).await;
            }
            return Err(e.into());
        }
    };

    let mut report = EnrichReport {
        run_id,
        mode: options.mode,
        dry_run: options.dry_run,
        scanned: candidates.len(),
        updated: 0,
        planned: Vec::new(),
        errors: Vec::new(),
    };
    let mut searched = false;

    for row in &candidates {
        let retail_price = if options.mode.wants_price() {
            match plan_price(row) {
                Ok(price) => price,
                Err(e) => {
                    report.errors.push(ItemError::new(&row.product_hash, e));
                    continue;
                }
            }
        } else {
            None
        };

        let mut image: Option<ImageHit> = None;
        if options.mode.wants_image() && row.image_url.is_none() {
            if searched {
                client.pause().await;
            }
            searched = true;
            match search_image(client, obf_base_url, &row.display_name).await {
                Ok(hit) => image = hit,
                Err(e) => {
                    tracing::warn!(product_hash = %row.product_hash, error = %e, "image search failed");
                    report.errors.push(ItemError::new(&row.product_hash, e));
                }
            }
        }

        if retail_price.is_none() && image.is_none() {
            continue;
        }

        let change = PlannedChange {
            product_hash: row.product_hash.clone(),
            display_name: row.display_name.clone(),
            retail_price,
            image_url: image.as_ref().map(|hit| hit.image_url.clone()),
            image_source_url: image.and_then(|hit| hit.source_url),
        };

        if !options.dry_run {
            let fields = CatalogFields {
                retail_price: change.retail_price,
                currency: change.retail_price.map(|_| "EUR".to_string()),
                image_url: change.image_url.clone(),
                ..CatalogFields::default()
            };
            match cgintel_db::update_catalog_enrichment(pool, &row.product_hash, fields).await {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    tracing::warn!(product_hash = %row.product_hash, error = %e, "enrichment write failed");
                    report.errors.push(ItemError::new(&row.product_hash, e));
                    continue;
                }
            }
        }

        report.planned.push(change);
    }

    if let Some(id) = run_id {
        let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        finish_run(pool, id, RunType::Enrich, report.updated, &errors).await?;
    }

    tracing::info!(
        mode = options.mode.as_str(),
        dry_run = options.dry_run,
        scanned = report.scanned,
        updated = report.updated,
        planned = report.planned.len(),
        errors = report.errors.len(),
        "enrichment sweep finished"
    );
    Ok(report)
}

//! Staging -> catalog promotion.

use cgintel_core::{
    acquisition_lead, category_for_product_type, classify_product_type, convert_to_eur,
    detect_actives, efficacy_score, lookup_brand_tier, CatalogFields, RunType, StagingRecord,
};
use cgintel_db::CatalogUpsertOutcome;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::runs::{begin_run, fail_run_best_effort, finish_run};
use crate::types::{ItemError, TriggerSource};

/// Counts for one promotion batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromoteSummary {
    pub scanned: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<ItemError>,
}

impl PromoteSummary {
    fn record(&mut self, product_hash: &str, result: Result<CatalogUpsertOutcome, PipelineError>) {
        self.scanned += 1;
        match result {
            Ok(outcome) if outcome.created => self.created += 1,
            Ok(_) => self.updated += 1,
            Err(e) => {
                tracing::warn!(product_hash, error = %e, "promotion failed");
                self.errors.push(ItemError::new(product_hash, e));
            }
        }
    }
}

/// Derives the catalog write for one staging record.
///
/// Classification runs on the name; brand drives the tier. A staging price is
/// converted to EUR, otherwise the tier's default price is used.
#[must_use]
pub fn catalog_fields_from_staging(record: &StagingRecord) -> CatalogFields {
    let product_type = classify_product_type(&record.name);
    let category = category_for_product_type(product_type);
    let tier = lookup_brand_tier(record.brand.as_deref());
    let profile = detect_actives(&record.ingredient_text(), product_type);

    let retail_price = record
        .price
        .and_then(|price| convert_to_eur(price, record.currency.as_deref()))
        .unwrap_or(tier.price);

    let name = record.name.trim();
    let display_name = if name.is_empty() {
        format!("Unknown {product_type}")
    } else {
        name.to_string()
    };

    CatalogFields {
        display_name: Some(display_name),
        category: Some(category.to_string()),
        product_type: Some(product_type.to_string()),
        price_tier: Some(tier.tier),
        efficacy_score: efficacy_score(&profile, record.rating, record.review_count),
        key_actives: profile.key_actives,
        suitable_for: profile.suitable_for,
        contraindications: profile.contraindications,
        retail_price: Some(retail_price),
        currency: Some("EUR".to_string()),
        image_url: record.image_url.clone(),
        source_url: record.source_url.clone(),
        status: None,
    }
}

/// Promotes one staging record into the catalog.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the merge transaction fails.
pub async fn promote_record(
    pool: &PgPool,
    record: &StagingRecord,
) -> Result<CatalogUpsertOutcome, PipelineError> {
    let fields = catalog_fields_from_staging(record);
    let lead = acquisition_lead(&record.product_hash);
    let outcome =
        cgintel_db::promote_catalog_product(pool, &record.product_hash, fields, &lead).await?;
    Ok(outcome)
}

/// Promotes a batch of records, collecting per-item failures.
pub(crate) async fn promote_batch(pool: &PgPool, records: &[StagingRecord]) -> PromoteSummary {
    let mut summary = PromoteSummary::default();
    for record in records {
        let result = promote_record(pool, record).await;
        summary.record(&record.product_hash, result);
    }
    summary
}

/// Promotes up to `limit` staging rows that have not been promoted since
/// their last scrape, recording a `promote` run.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the run bookkeeping or the staging query
/// fails. Per-row failures are reported in the summary.
pub async fn promote_pending(
    pool: &PgPool,
    limit: i64,
    trigger: TriggerSource,
) -> Result<PromoteSummary, PipelineError> {
    let run_id = begin_run(pool, RunType::Promote, trigger).await?;

    let rows = match cgintel_db::list_unpromoted_staging(pool, limit).await {
        Ok(rows) => rows,
        Err(e) => {
            fail_run_best_effort(pool, run_id, RunType::Promote, format!("{e:#}")).await;
            return Err(e.into());
        }
    };
    let records: Vec<StagingRecord> = rows.into_iter().map(StagingRecord::from).collect();
    let summary = promote_batch(pool, &records).await;

    let errors: Vec<String> = summary.errors.iter().map(ToString::to_string).collect();
    finish_run(
        pool,
        run_id,
        RunType::Promote,
        summary.created + summary.updated,
        &errors,
    )
    .await?;

    Ok(summary)
}

//! Product intelligence pipeline: scrape -> stage -> promote -> enrich ->
//! export.
//!
//! Shared by the admin API and the CLI so both entry points run the same
//! code paths and record the same `collection_runs` audit rows.

pub mod enrich;
pub mod error;
pub mod export;
pub mod ingest;
pub mod promote;
pub mod runs;
pub mod types;

pub use enrich::{
    clamp_enrich_limit, plan_price, run_enrichment, EnrichMode, EnrichOptions, EnrichReport,
    PlannedChange, MAX_ENRICH_LIMIT,
};
pub use error::PipelineError;
pub use export::{export_stocked_csv, render_shopify_csv, shopify_handle, SHOPIFY_COLUMNS};
pub use ingest::{run_scrape, ScrapeReport, ScrapeRequest, ScrapeSource};
pub use promote::{catalog_fields_from_staging, promote_pending, promote_record, PromoteSummary};
pub use types::{ItemError, TriggerSource};

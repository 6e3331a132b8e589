//! Promotion, enrichment, export and run-history commands.

use std::path::Path;

use cgintel_core::RunType;
use cgintel_pipeline::{EnrichMode, EnrichOptions, TriggerSource};

pub(crate) async fn run_promote(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    if limit < 1 {
        anyhow::bail!("--limit must be at least 1");
    }

    let summary = cgintel_pipeline::promote_pending(pool, limit, TriggerSource::Cli).await?;
    println!(
        "scanned {} staging row(s): {} created, {} updated, {} failed",
        summary.scanned,
        summary.created,
        summary.updated,
        summary.errors.len()
    );
    for error in &summary.errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

pub(crate) async fn run_enrich(
    pool: &sqlx::PgPool,
    config: &cgintel_core::AppConfig,
    mode: &str,
    limit: i64,
    dry_run: bool,
) -> anyhow::Result<()> {
    let options = EnrichOptions {
        mode: mode.parse::<EnrichMode>()?,
        limit: cgintel_pipeline::clamp_enrich_limit(Some(limit)),
        dry_run,
    };
    let client = cgintel_scraper::ScraperClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build scraper client: {e}"))?;

    let report = cgintel_pipeline::run_enrichment(
        pool,
        &client,
        &config.obf_base_url,
        options,
        TriggerSource::Cli,
    )
    .await?;

    if report.dry_run {
        println!(
            "dry-run: {} of {} row(s) would change",
            report.planned.len(),
            report.scanned
        );
        for change in &report.planned {
            let price = change
                .retail_price
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            let image = change.image_url.as_deref().unwrap_or("-");
            println!(
                "  {}  {}  price={price}  image={image}",
                change.product_hash, change.display_name
            );
        }
    } else {
        println!(
            "enriched {} of {} row(s) ({} mode)",
            report.updated,
            report.scanned,
            report.mode.as_str()
        );
    }
    for error in &report.errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

pub(crate) async fn run_export(
    pool: &sqlx::PgPool,
    config: &cgintel_core::AppConfig,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let (csv, rows) = cgintel_pipeline::export_stocked_csv(pool, &config.store_vendor).await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, csv.as_bytes()).await?;
            eprintln!("wrote {rows} product(s) to {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

pub(crate) async fn run_list_runs(
    pool: &sqlx::PgPool,
    run_type: Option<RunType>,
    limit: i64,
) -> anyhow::Result<()> {
    let runs = cgintel_db::list_collection_runs(pool, run_type, limit.clamp(1, 200)).await?;
    if runs.is_empty() {
        println!("no runs recorded");
        return Ok(());
    }

    for run in runs {
        let finished = run
            .completed_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        println!(
            "{:>6}  {:<8} {:<4} {:<10} {:>6}  {finished}{}",
            run.id,
            run.run_type,
            run.trigger_source,
            run.status,
            run.records_processed,
            run.error_message
                .as_deref()
                .map(|m| format!("  ({})", m.lines().next().unwrap_or_default()))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

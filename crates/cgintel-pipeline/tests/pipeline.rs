//! End-to-end pipeline tests against a migrated database (`#[sqlx::test]`)
//! and a local `wiremock` server standing in for the external catalogs.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use cgintel_core::{AppConfig, Decision, Environment, Priority, RunType, StagingRecord};
use cgintel_db::{
    get_catalog_product, get_collection_run, get_source_intelligence, get_staging_record,
    list_collection_runs, upsert_staging_record, upsert_stocking_decision, StockingDecisionInput,
};
use cgintel_pipeline::{
    export_stocked_csv, promote_pending, run_enrichment, run_scrape, EnrichMode, EnrichOptions,
    ScrapeRequest, ScrapeSource, TriggerSource,
};
use cgintel_scraper::ScraperClient;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(base: &str) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
        log_level: "info".to_string(),
        admin_token: Some("test-token".to_string()),
        db_max_connections: 5,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
        scraper_request_timeout_secs: 5,
        scraper_user_agent: "cgintel-test/0.1".to_string(),
        scraper_inter_request_delay_ms: 0,
        obf_base_url: base.to_string(),
        amazon_base_url: base.to_string(),
        store_vendor: "CrazyGels".to_string(),
    }
}

fn client() -> ScraperClient {
    ScraperClient::new(5, "cgintel-test/0.1", 0).expect("client")
}

fn staging(name: &str, id: &str, brand: Option<&str>) -> StagingRecord {
    let mut rec = StagingRecord::new("open_beauty_facts", Some(id.to_string()), name);
    rec.brand = brand.map(str::to_string);
    rec
}

async fn stage_and_promote(pool: &sqlx::PgPool, records: &[StagingRecord]) {
    for rec in records {
        upsert_staging_record(pool, rec).await.expect("stage");
    }
    let summary = promote_pending(pool, 100, TriggerSource::Cli)
        .await
        .expect("promote");
    assert!(summary.errors.is_empty(), "errors: {:?}", summary.errors);
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn promote_pending_creates_catalog_rows_and_source_stub(pool: sqlx::PgPool) {
    let rec = staging("Crème de la Mer Moisturizing Cream", "3614272049529", Some("La Mer"));
    upsert_staging_record(&pool, &rec).await.expect("stage");

    let summary = promote_pending(&pool, 100, TriggerSource::Cli)
        .await
        .expect("promote");
    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.created, 1);

    let row = get_catalog_product(&pool, &rec.product_hash)
        .await
        .expect("query")
        .expect("catalog row");
    assert_eq!(row.price_tier.as_deref(), Some("luxury"));
    assert_eq!(row.retail_price, Some(Decimal::new(8500, 2)));
    assert_eq!(row.status, "research");

    let source = get_source_intelligence(&pool, &rec.product_hash)
        .await
        .expect("query")
        .expect("source row");
    assert_eq!(source.acquisition_lead, cgintel_core::acquisition_lead(&rec.product_hash));

    let staged = get_staging_record(&pool, &rec.product_hash)
        .await
        .expect("query")
        .expect("staging row");
    assert!(staged.promoted_at.is_some());

    // Nothing left to promote on a second pass.
    let again = promote_pending(&pool, 100, TriggerSource::Cli)
        .await
        .expect("promote");
    assert_eq!(again.scanned, 0);

    let runs = list_collection_runs(&pool, Some(RunType::Promote), 10)
        .await
        .expect("runs");
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.run_type == "promote" && r.status == "succeeded"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn repromotion_keeps_sticky_tier_and_status(pool: sqlx::PgPool) {
    let rec = staging("Hydrating Serum", "42", Some("Clinique"));
    stage_and_promote(&pool, std::slice::from_ref(&rec)).await;

    upsert_stocking_decision(
        &pool,
        &StockingDecisionInput {
            product_hash: rec.product_hash.clone(),
            decision: Decision::Stock,
            retail_price: None,
            initial_quantity: Some(5),
            fulfillment_method: None,
            priority: Some(Priority::High),
            notes: None,
        },
    )
    .await
    .expect("decision");

    let mut renamed = rec.clone();
    renamed.brand = Some("Unknown Indie Brand".to_string());
    stage_and_promote(&pool, &[renamed]).await;

    let row = get_catalog_product(&pool, &rec.product_hash)
        .await
        .expect("query")
        .expect("row");
    assert_eq!(row.price_tier.as_deref(), Some("premium"));
    assert_eq!(row.status, "listed");
}

// ---------------------------------------------------------------------------
// Scrape runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn obf_scrape_stages_and_promotes(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/search"))
        .and(query_param("categories_tags", "en:face-serums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "page_size": 50,
            "products": [
                { "code": "111", "product_name": "Niacinamide Serum", "brands": "The Ordinary",
                  "ingredients_text": "Aqua, Niacinamide, Zinc PCA" },
                { "code": "222", "product_name": "Retinol Night Serum", "brands": "CeraVe",
                  "image_url": "https://img.test/222.jpg" }
            ]
        })))
        .mount(&server)
        .await;

    let report = run_scrape(
        &pool,
        &client(),
        &config(&server.uri()),
        ScrapeSource::OpenBeautyFacts,
        &ScrapeRequest {
            pages: Some(2),
            targets: vec!["en:face-serums".to_string()],
            promote: true,
        },
        TriggerSource::Api,
    )
    .await
    .expect("scrape");

    assert_eq!(report.collected, 2);
    assert_eq!(report.staged, 2);
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
    let promotion = report.promotion.expect("promotion summary");
    assert_eq!(promotion.created, 2);

    let run = get_collection_run(&pool, report.run_id).await.expect("run");
    assert_eq!(run.run_type, "obf");
    assert_eq!(run.trigger_source, "api");
    assert_eq!(run.status, "succeeded");
    assert_eq!(run.records_processed, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn amazon_scrape_failure_still_completes_run_with_errors(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let report = run_scrape(
        &pool,
        &client(),
        &config(&server.uri()),
        ScrapeSource::Amazon,
        &ScrapeRequest {
            pages: Some(1),
            targets: vec!["gesichtsserum".to_string()],
            promote: false,
        },
        TriggerSource::Cli,
    )
    .await
    .expect("scrape");

    assert_eq!(report.staged, 0);
    assert_eq!(report.errors.len(), 1);
    assert!(report.promotion.is_none());

    let run = get_collection_run(&pool, report.run_id).await.expect("run");
    assert_eq!(run.status, "succeeded");
    assert!(run.error_message.is_some());
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn enrichment_dry_run_plans_without_writing(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "products": [{ "code": "777", "image_url": "https://img.test/777.jpg" }]
        })))
        .mount(&server)
        .await;

    let rec = staging("Barrier Cream", "777", None);
    stage_and_promote(&pool, std::slice::from_ref(&rec)).await;

    let report = run_enrichment(
        &pool,
        &client(),
        &server.uri(),
        EnrichOptions {
            mode: EnrichMode::All,
            limit: 200,
            dry_run: true,
        },
        TriggerSource::Api,
    )
    .await
    .expect("enrich");

    assert!(report.run_id.is_none());
    assert_eq!(report.scanned, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.planned.len(), 1);
    assert_eq!(
        report.planned[0].image_url.as_deref(),
        Some("https://img.test/777.jpg")
    );
    assert_eq!(
        report.planned[0].image_source_url,
        Some(format!("{}/product/777", server.uri()))
    );

    let row = get_catalog_product(&pool, &rec.product_hash)
        .await
        .expect("query")
        .expect("row");
    assert!(row.image_url.is_none(), "dry run must not write");
}

#[sqlx::test(migrations = "../../migrations")]
async fn enrichment_image_mode_fills_only_missing_image(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "products": [{ "code": "888", "image_small_url": "https://img.test/888.jpg" }]
        })))
        .mount(&server)
        .await;

    let rec = staging("Lip Balm", "888", Some("Nivea"));
    stage_and_promote(&pool, std::slice::from_ref(&rec)).await;
    let before = get_catalog_product(&pool, &rec.product_hash)
        .await
        .expect("query")
        .expect("row");

    let report = run_enrichment(
        &pool,
        &client(),
        &server.uri(),
        EnrichOptions {
            mode: EnrichMode::Image,
            limit: 10,
            dry_run: false,
        },
        TriggerSource::Cli,
    )
    .await
    .expect("enrich");

    assert_eq!(report.updated, 1);
    assert!(report.planned[0].retail_price.is_none());

    let after = get_catalog_product(&pool, &rec.product_hash)
        .await
        .expect("query")
        .expect("row");
    assert_eq!(after.image_url.as_deref(), Some("https://img.test/888.jpg"));
    assert_eq!(after.retail_price, before.retail_price);
    assert_eq!(after.display_name, before.display_name);

    let run = get_collection_run(&pool, report.run_id.expect("run id"))
        .await
        .expect("run");
    assert_eq!(run.run_type, "enrich");
    assert_eq!(run.records_processed, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn enrichment_search_failure_is_reported_per_row(pool: sqlx::PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let rec = staging("Face Mask", "999", None);
    stage_and_promote(&pool, std::slice::from_ref(&rec)).await;

    let report = run_enrichment(
        &pool,
        &client(),
        &server.uri(),
        EnrichOptions {
            mode: EnrichMode::Image,
            limit: 10,
            dry_run: false,
        },
        TriggerSource::Api,
    )
    .await
    .expect("enrich");

    assert_eq!(report.updated, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].product_hash, rec.product_hash);
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn export_contains_only_stocked_rows_in_priority_order(pool: sqlx::PgPool) {
    let a = staging("Alpha Serum", "a1", None);
    let b = staging("Beta Cream", "b1", None);
    let c = staging("Gamma Toner", "c1", None);
    stage_and_promote(&pool, &[a.clone(), b.clone(), c.clone()]).await;

    for (rec, decision, priority) in [
        (&a, Decision::Stock, Some(Priority::Low)),
        (&b, Decision::Stock, Some(Priority::Urgent)),
        (&c, Decision::Reject, None),
    ] {
        upsert_stocking_decision(
            &pool,
            &StockingDecisionInput {
                product_hash: rec.product_hash.clone(),
                decision,
                retail_price: None,
                initial_quantity: None,
                fulfillment_method: None,
                priority,
                notes: None,
            },
        )
        .await
        .expect("decision");
    }

    let (csv_text, count) = export_stocked_csv(&pool, "CrazyGels").await.expect("export");
    assert_eq!(count, 2);

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let titles: Vec<String> = reader
        .records()
        .map(|r| r.expect("record")[1].to_string())
        .collect();
    assert_eq!(titles, vec!["Beta Cream", "Alpha Serum"]);
}

//! Offline unit tests for cgintel-db pool configuration and row types.
//! These tests do not require a live database connection.

use cgintel_core::{AppConfig, CatalogStatus, Environment, PriceTier};
use cgintel_db::{CatalogProductRow, DbError, PoolConfig};
use chrono::Utc;
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        admin_token: Some("token".to_string()),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        scraper_request_timeout_secs: 15,
        scraper_user_agent: "ua".to_string(),
        scraper_inter_request_delay_ms: 250,
        obf_base_url: "http://obf.test".to_string(),
        amazon_base_url: "http://amazon.test".to_string(),
        store_vendor: "CrazyGels".to_string(),
    }
}

fn catalog_row(price_tier: Option<&str>, status: &str) -> CatalogProductRow {
    CatalogProductRow {
        product_hash: "0123456789abcdef".to_string(),
        display_name: "Niacinamide Serum".to_string(),
        category: Some("serums".to_string()),
        product_type: Some("serum".to_string()),
        price_tier: price_tier.map(str::to_string),
        efficacy_score: Some(0.8),
        key_actives: vec!["niacinamide".to_string()],
        suitable_for: vec![],
        contraindications: vec![],
        retail_price: Some(Decimal::new(999, 2)),
        currency: Some("EUR".to_string()),
        image_url: None,
        source_url: None,
        status: status.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn catalog_row_fields_parse_tier_and_status() {
    let fields = catalog_row(Some("premium"), "listed")
        .fields()
        .expect("valid row");
    assert_eq!(fields.price_tier, Some(PriceTier::Premium));
    assert_eq!(fields.status, Some(CatalogStatus::Listed));
    assert_eq!(fields.display_name.as_deref(), Some("Niacinamide Serum"));
}

#[test]
fn catalog_row_fields_reject_unknown_tier() {
    let result = catalog_row(Some("platinum"), "research").fields();
    assert!(
        matches!(result, Err(DbError::InvalidStoredValue(_))),
        "expected InvalidStoredValue, got: {result:?}"
    );
}

#[test]
fn catalog_row_without_tier_is_valid() {
    let row = catalog_row(None, "research");
    assert_eq!(row.tier().expect("tier"), None);
}

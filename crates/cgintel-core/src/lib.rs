//! Domain types and business rules for the product intelligence pipeline.
//!
//! Nothing in this crate performs I/O except [`config`], which reads the
//! process environment.

pub mod app_config;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod identity;
pub mod pricing;
pub mod run;
pub mod staging;
pub mod stocking;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{merge_catalog, CatalogFields, CatalogStatus, PriceTier};
pub use classify::{
    category_for_product_type, classify_product_type, detect_actives, efficacy_score,
    lookup_brand_tier, ActiveProfile, TierMatch,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use identity::{acquisition_lead, product_hash};
pub use pricing::{convert_to_eur, estimated_margin_pct, tier_default_price, tier_multiplier};
pub use run::RunType;
pub use staging::StagingRecord;
pub use stocking::{Decision, Priority};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid price tier: {0}")]
    InvalidPriceTier(String),
    #[error("invalid catalog status: {0}")]
    InvalidCatalogStatus(String),
    #[error("invalid stocking decision: {0}")]
    InvalidDecision(String),
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
    #[error("invalid run type: {0}")]
    InvalidRunType(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::product_hash;

pub const SOURCE_OPEN_BEAUTY_FACTS: &str = "open_beauty_facts";
pub const SOURCE_AMAZON_DE: &str = "amazon_de";

/// A raw product scraped from one external source, before promotion.
///
/// Staging rows are overwritten on every scrape; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRecord {
    pub product_hash: String,
    /// Collector identifier, e.g. `"open_beauty_facts"` or `"amazon_de"`.
    pub source: String,
    /// Barcode (OBF) or ASIN (Amazon).
    pub external_id: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    /// Source-side category label, e.g. the OBF category tag.
    pub category: Option<String>,
    pub price: Option<Decimal>,
    /// ISO 4217 code of `price`.
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub ingredients: Option<String>,
    /// Average star rating on a 0-5 scale.
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub scraped_at: DateTime<Utc>,
}

impl StagingRecord {
    /// Start a record with its identity fields; the hash falls back to the
    /// name when the source has no external id.
    #[must_use]
    pub fn new(source: &str, external_id: Option<String>, name: &str) -> Self {
        let id_or_name = external_id.as_deref().unwrap_or(name);
        Self {
            product_hash: product_hash(source, id_or_name, name),
            source: source.to_string(),
            external_id,
            name: name.to_string(),
            brand: None,
            category: None,
            price: None,
            currency: None,
            image_url: None,
            source_url: None,
            ingredients: None,
            rating: None,
            review_count: None,
            scraped_at: Utc::now(),
        }
    }

    /// Text scanned for active ingredients: the name plus the ingredient list.
    #[must_use]
    pub fn ingredient_text(&self) -> String {
        match self.ingredients.as_deref() {
            Some(ingredients) if !ingredients.trim().is_empty() => {
                format!("{} {}", self.name, ingredients)
            }
            _ => self.name.clone(),
        }
    }
}

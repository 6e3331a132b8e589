//! Wire types for Open Beauty Facts and the shared collector result.
//!
//! OBF's v2 search endpoint returns `count`, `page`, `page_size` and
//! `products`. Counts arrive as numbers on some mirrors and strings on
//! others, so they are read leniently. Every product field is optional and
//! `product_name` is frequently an empty string.

use cgintel_core::StagingRecord;
use serde::{Deserialize, Deserializer};

/// Upper bound on pages fetched per category or query.
pub const MAX_PAGES: u32 = 5;

/// Clamps a requested page count into `1..=MAX_PAGES`. `None` means one page.
#[must_use]
pub fn clamp_pages(requested: Option<u32>) -> u32 {
    requested.unwrap_or(1).clamp(1, MAX_PAGES)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObfSearchResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page_size: u64,
    #[serde(default)]
    pub products: Vec<ObfProduct>,
}

impl ObfSearchResponse {
    /// Total pages implied by `count` and `page_size`; zero when either is
    /// missing.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.count.div_ceil(self.page_size)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObfProduct {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    #[serde(default)]
    pub ingredients_text: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_front_url: Option<String>,
    #[serde(default)]
    pub image_small_url: Option<String>,
    #[serde(default)]
    pub categories_tags: Vec<String>,
}

impl ObfProduct {
    /// First non-blank image field, preferring the full-size image.
    #[must_use]
    pub fn best_image(&self) -> Option<&str> {
        [&self.image_url, &self.image_front_url, &self.image_small_url]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// Records gathered by one collector run.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub records: Vec<StagingRecord>,
    pub pages_fetched: u32,
    /// Product detail pages read after the search pages (Amazon only).
    pub detail_pages_fetched: u32,
    /// One message per page loop that ended on an error.
    pub errors: Vec<String>,
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(u64),
        Str(String),
        Null,
    }

    Ok(match NumOrString::deserialize(deserializer)? {
        NumOrString::Num(n) => n,
        NumOrString::Str(s) => s.trim().parse().unwrap_or(0),
        NumOrString::Null => 0,
    })
}

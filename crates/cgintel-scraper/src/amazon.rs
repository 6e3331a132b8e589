//! Amazon search-result collector.
//!
//! Search pages are plain HTML. Product cards are located by their
//! `data-asin` attribute and each field is pulled out with a targeted regex;
//! a card without an ASIN or a title is skipped.
//!
//! After a query's result pages are read, the first
//! [`DETAIL_PAGES_PER_QUERY`] new products are followed to their `/dp/{asin}`
//! page for the ingredient list and the full-size image. The first failed
//! detail page ends the detail pass for the rest of the run; the listing
//! data is kept either way.

use std::collections::HashSet;
use std::sync::LazyLock;

use cgintel_core::{staging::SOURCE_AMAZON_DE, StagingRecord};
use regex::Regex;

use crate::client::{build_url, ScraperClient};
use crate::error::ScraperError;
use crate::parse::{clean_text, parse_price, parse_rating, parse_review_count, truncate_chars};
use crate::types::CollectOutcome;

static CARD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*\bdata-asin\s*=\s*["']([A-Za-z0-9]{5,})["'][^>]*>"#)
        .expect("valid regex")
});
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h2\b[^>]*>.*?<span\b[^>]*>(.*?)</span>").expect("valid regex")
});
static TITLE_FALLBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*class\s*=\s*["'][^"']*\ba-text-normal\b[^"']*["'][^>]*>(.*?)</span>"#)
        .expect("valid regex")
});
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*class\s*=\s*["'][^"']*\ba-offscreen\b[^"']*["'][^>]*>(.*?)</span>"#)
        .expect("valid regex")
});
static RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:von|out of)\s*5").expect("valid regex")
});
static REVIEW_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)aria-label\s*=\s*["']([^"']*(?:bewertung|rating|review)[^"']*)["']"#)
        .expect("valid regex")
});
static BRAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*class\s*=\s*["'][^"']*\ba-size-base-plus a-color-base\b[^"']*["'][^>]*>(.*?)</span>"#)
        .expect("valid regex")
});
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));

static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("class"));
static SRC_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("src"));
static ID_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("id"));
static HIRES_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| attr_regex("data-old-hires"));

/// Detail-table row whose header names the ingredient list.
static INGREDIENT_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<t[hd]\b[^>]*>(?:\s|<[^>]*>)*(?:inhaltsstoffe|ingredients)\b.*?</t[hd]>\s*<td\b[^>]*>(.*?)</td>")
        .expect("valid regex")
});
/// Ingredient paragraph in the "important information" block.
static IMPORTANT_INGREDIENTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)id\s*=\s*["']important-information["'].*?(?:inhaltsstoffe|ingredients)\s*:?\s*</h\d>\s*(?:<p\b[^>]*>)?(.*?)</(?:p|div)>"#)
        .expect("valid regex")
});

/// Products per query whose detail page is fetched.
pub const DETAIL_PAGES_PER_QUERY: usize = 24;

const MAX_INGREDIENTS_CHARS: usize = 2000;

/// Search terms and the staging category each one feeds, in order.
pub const DEFAULT_AMAZON_QUERIES: &[(&str, &str)] = &[
    ("gesichtsserum", "serums"),
    ("gesichtscreme feuchtigkeitspflege", "moisturizers"),
    ("shampoo haarpflege", "shampoo_conditioner"),
    ("damenparfum", "fragrances"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmazonQuery {
    pub query: String,
    pub category: String,
}

impl AmazonQuery {
    /// A caller-supplied query whose category is the query text itself.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().to_string();
        Self {
            category: query.clone(),
            query,
        }
    }

    #[must_use]
    pub fn defaults() -> Vec<Self> {
        DEFAULT_AMAZON_QUERIES
            .iter()
            .map(|(query, category)| Self {
                query: (*query).to_string(),
                category: (*category).to_string(),
            })
            .collect()
    }
}

/// Collects staging records for each query, `pages` result pages each.
///
/// A failed page or a page without product cards ends that query's loop.
pub async fn collect_amazon(
    client: &ScraperClient,
    base_url: &str,
    queries: &[AmazonQuery],
    pages: u32,
) -> CollectOutcome {
    let mut outcome = CollectOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut first_request = true;
    let mut details_enabled = true;

    for query in queries {
        let query_start = outcome.records.len();
        for page in 1..=pages {
            if !first_request {
                client.pause().await;
            }
            first_request = false;

            let page_str = page.to_string();
            let html = match build_url(
                base_url,
                "/s",
                &[("k", query.query.as_str()), ("page", &page_str)],
            ) {
                Ok(url) => client.get_html(&url).await,
                Err(e) => Err(e),
            };

            let html = match html {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(query = %query.query, page, error = %e, "Amazon page failed");
                    outcome
                        .errors
                        .push(format!("amazon \"{}\" page {page}: {e}", query.query));
                    break;
                }
            };
            outcome.pages_fetched += 1;

            let records = parse_search_page(base_url, &query.category, &html);
            if records.is_empty() {
                tracing::info!(query = %query.query, page, "Amazon page had no product cards");
                break;
            }

            let found = records.len();
            outcome.records.extend(
                records
                    .into_iter()
                    .filter(|r| seen.insert(r.product_hash.clone())),
            );
            tracing::debug!(query = %query.query, page, found, "Amazon page collected");
        }

        if !details_enabled {
            continue;
        }
        for record in outcome.records[query_start..]
            .iter_mut()
            .take(DETAIL_PAGES_PER_QUERY)
        {
            client.pause().await;
            match fetch_detail(client, base_url, record).await {
                Ok(detail) => {
                    outcome.detail_pages_fetched += 1;
                    detail.apply_to(record);
                }
                Err(e) => {
                    tracing::warn!(
                        asin = record.external_id.as_deref().unwrap_or_default(),
                        error = %e,
                        "Amazon detail page failed; skipping remaining detail pages"
                    );
                    outcome.errors.push(format!(
                        "amazon detail {}: {e}",
                        record.external_id.as_deref().unwrap_or(&record.name)
                    ));
                    details_enabled = false;
                    break;
                }
            }
        }
    }

    tracing::info!(
        records = outcome.records.len(),
        pages = outcome.pages_fetched,
        detail_pages = outcome.detail_pages_fetched,
        errors = outcome.errors.len(),
        "Amazon collection finished"
    );
    outcome
}

/// Extracts staging records from one search-result page.
///
/// Nested elements repeating the same ASIN are collapsed into the first card
/// that yields a title.
#[must_use]
pub fn parse_search_page(base_url: &str, category: &str, html: &str) -> Vec<StagingRecord> {
    let openings: Vec<(usize, String)> = CARD_OPEN_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            Some((start, caps.get(1)?.as_str().to_string()))
        })
        .collect();

    let mut seen_asins: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for (idx, (start, asin)) in openings.iter().enumerate() {
        if seen_asins.contains(asin) {
            continue;
        }
        let end = openings.get(idx + 1).map_or(html.len(), |(next, _)| *next);
        let card = &html[*start..end];

        if let Some(record) = parse_card(base_url, category, asin, card) {
            seen_asins.insert(asin.clone());
            records.push(record);
        }
    }

    records
}

fn parse_card(base_url: &str, category: &str, asin: &str, card: &str) -> Option<StagingRecord> {
    let name = first_capture(&TITLE_RE, card)
        .or_else(|| first_capture(&TITLE_FALLBACK_RE, card))
        .map(|raw| clean_text(&raw))
        .filter(|name| !name.is_empty())?;

    let mut record = StagingRecord::new(SOURCE_AMAZON_DE, Some(asin.to_string()), &name);
    record.category = Some(category.to_string());
    record.brand = first_capture(&BRAND_RE, card)
        .map(|raw| clean_text(&raw))
        .filter(|b| !b.is_empty())
        .or_else(|| name.split_whitespace().next().map(str::to_string));
    record.price = first_capture(&PRICE_RE, card).and_then(|raw| parse_price(&clean_text(&raw)));
    record.currency = record.price.map(|_| "EUR".to_string());
    record.rating = RATING_RE
        .captures(card)
        .and_then(|caps| parse_rating(caps.get(0)?.as_str()));
    record.review_count = REVIEW_LABEL_RE
        .captures_iter(card)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|label| !RATING_RE.is_match(label))
        .find_map(parse_review_count);
    record.image_url = IMG_TAG_RE
        .find_iter(card)
        .map(|m| m.as_str())
        .find(|tag| attr_value(&CLASS_ATTR_RE, tag).is_some_and(|c| c.contains("s-image")))
        .and_then(|tag| attr_value(&SRC_ATTR_RE, tag));
    record.source_url = build_url(base_url, &format!("/dp/{asin}"), &[]).ok();

    Some(record)
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))
}

/// Fields read from a product detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDetail {
    pub ingredients: Option<String>,
    /// Full-size main image (`data-old-hires`, else `src`).
    pub image_url: Option<String>,
}

impl ProductDetail {
    /// Fills the record's ingredients when missing and swaps the listing
    /// thumbnail for the full-size image.
    pub fn apply_to(self, record: &mut StagingRecord) {
        if record.ingredients.is_none() {
            record.ingredients = self.ingredients;
        }
        if self.image_url.is_some() {
            record.image_url = self.image_url;
        }
    }
}

async fn fetch_detail(
    client: &ScraperClient,
    base_url: &str,
    record: &StagingRecord,
) -> Result<ProductDetail, ScraperError> {
    let asin = record.external_id.as_deref().unwrap_or_default();
    let url = build_url(base_url, &format!("/dp/{asin}"), &[])?;
    let html = client.get_html(&url).await?;
    Ok(parse_detail_page(&html))
}

/// Extracts the ingredient list and main image from a product detail page.
#[must_use]
pub fn parse_detail_page(html: &str) -> ProductDetail {
    let ingredients = first_capture(&INGREDIENT_ROW_RE, html)
        .or_else(|| first_capture(&IMPORTANT_INGREDIENTS_RE, html))
        .map(|raw| clean_text(&raw))
        .filter(|text| !text.is_empty())
        .map(|text| truncate_chars(&text, MAX_INGREDIENTS_CHARS));

    let image_url = IMG_TAG_RE
        .find_iter(html)
        .map(|m| m.as_str())
        .find(|tag| {
            attr_value(&ID_ATTR_RE, tag)
                .is_some_and(|id| id == "landingImage" || id == "main-image")
        })
        .and_then(|tag| {
            attr_value(&HIRES_ATTR_RE, tag).or_else(|| attr_value(&SRC_ATTR_RE, tag))
        });

    ProductDetail {
        ingredients,
        image_url,
    }
}

fn attr_regex(attr: &str) -> Regex {
    Regex::new(&format!(r#"(?is)[\s<]{}\s*=\s*["']([^"']+)["']"#, regex::escape(attr)))
        .expect("valid regex")
}

fn attr_value(re: &Regex, tag: &str) -> Option<String> {
    re.captures(tag)
        .and_then(|c| c.get(1).map(|m| m.as_str().trim().replace("&amp;", "&")))
}

#[cfg(test)]
#[path = "amazon_test.rs"]
mod tests;

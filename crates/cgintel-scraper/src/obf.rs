//! Open Beauty Facts collector.

use cgintel_core::{staging::SOURCE_OPEN_BEAUTY_FACTS, StagingRecord};

use crate::client::{build_url, ScraperClient};
use crate::error::ScraperError;
use crate::parse::truncate_chars;
use crate::types::{CollectOutcome, ObfProduct, ObfSearchResponse};

/// Category tags searched when the caller does not name any, in order.
pub const DEFAULT_OBF_CATEGORIES: &[&str] = &[
    "en:moisturizers",
    "en:face-creams",
    "en:face-serums",
    "en:face-cleansers",
    "en:shampoos",
    "en:hair-conditioners",
    "en:sunscreen",
    "en:lip-balms",
    "en:body-milks",
    "en:face-masks",
];

pub const OBF_PAGE_SIZE: u32 = 50;

const OBF_FIELDS: &str = "code,product_name,brands,ingredients_text,image_url,categories_tags";
const MIN_NAME_CHARS: usize = 3;
const MAX_INGREDIENT_CHARS: usize = 1000;

/// Collects staging records for each category tag, `pages` pages each.
///
/// A failed page ends that category's loop; the error is recorded and the
/// next category is tried. The caller is expected to have clamped `pages`.
pub async fn collect_obf(
    client: &ScraperClient,
    base_url: &str,
    categories: &[String],
    pages: u32,
) -> CollectOutcome {
    let mut outcome = CollectOutcome::default();
    let mut first_request = true;

    for category in categories {
        for page in 1..=pages {
            if !first_request {
                client.pause().await;
            }
            first_request = false;

            let response = match fetch_page(client, base_url, category, page).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(category = %category, page, error = %e, "OBF page failed");
                    outcome.errors.push(format!("obf {category} page {page}: {e}"));
                    break;
                }
            };
            outcome.pages_fetched += 1;

            let fetched = response.products.len();
            let before = outcome.records.len();
            outcome.records.extend(
                response
                    .products
                    .iter()
                    .filter_map(|p| staging_from_obf(base_url, category, p)),
            );
            tracing::debug!(
                category = %category,
                page,
                fetched,
                kept = outcome.records.len() - before,
                "OBF page collected"
            );

            let last_page = response.page_count();
            if fetched < OBF_PAGE_SIZE as usize || (last_page > 0 && u64::from(page) >= last_page) {
                break;
            }
        }
    }

    tracing::info!(
        records = outcome.records.len(),
        pages = outcome.pages_fetched,
        errors = outcome.errors.len(),
        "OBF collection finished"
    );
    outcome
}

async fn fetch_page(
    client: &ScraperClient,
    base_url: &str,
    category: &str,
    page: u32,
) -> Result<ObfSearchResponse, ScraperError> {
    let page_str = page.to_string();
    let page_size = OBF_PAGE_SIZE.to_string();
    let url = build_url(
        base_url,
        "/api/v2/search",
        &[
            ("categories_tags", category),
            ("page_size", &page_size),
            ("page", &page_str),
            ("fields", OBF_FIELDS),
        ],
    )?;
    client
        .get_json(&url, &format!("OBF search {category} page {page}"))
        .await
}

/// Maps one OBF product into a staging record.
///
/// Returns `None` for products whose trimmed name is shorter than three
/// characters. OBF carries no prices, so `price` stays empty.
#[must_use]
pub fn staging_from_obf(
    base_url: &str,
    category_tag: &str,
    product: &ObfProduct,
) -> Option<StagingRecord> {
    let name = product.product_name.as_deref().map(str::trim)?;
    if name.chars().count() < MIN_NAME_CHARS {
        return None;
    }

    let code = non_blank(product.code.as_deref());
    let mut record = StagingRecord::new(SOURCE_OPEN_BEAUTY_FACTS, code.clone(), name);

    record.brand = non_blank(product.brands.as_deref())
        .and_then(|b| b.split(',').map(str::trim).find(|s| !s.is_empty()).map(str::to_string));
    record.category = Some(category_label(category_tag));
    record.image_url = product.best_image().map(str::to_string);
    record.ingredients = non_blank(product.ingredients_text.as_deref())
        .map(|text| truncate_chars(&text, MAX_INGREDIENT_CHARS));
    record.source_url = code
        .as_deref()
        .and_then(|c| build_url(base_url, &format!("/product/{c}"), &[]).ok());

    Some(record)
}

/// `"en:face-serums"` -> `"face serums"`.
fn category_label(tag: &str) -> String {
    let bare = tag.split_once(':').map_or(tag, |(_, rest)| rest);
    bare.replace('-', " ")
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

//! Shopify product-import CSV for stocked products.

use cgintel_core::{tier_default_price, PriceTier, Priority};
use cgintel_db::StockExportRow;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::PipelineError;

pub const SEO_TITLE_MAX_CHARS: usize = 60;
pub const SEO_DESCRIPTION_MAX_CHARS: usize = 155;

/// Column header row of Shopify's product import template, in order.
pub const SHOPIFY_COLUMNS: [&str; 49] = [
    "Handle",
    "Title",
    "Body (HTML)",
    "Vendor",
    "Product Category",
    "Type",
    "Tags",
    "Published",
    "Option1 Name",
    "Option1 Value",
    "Option2 Name",
    "Option2 Value",
    "Option3 Name",
    "Option3 Value",
    "Variant SKU",
    "Variant Grams",
    "Variant Inventory Tracker",
    "Variant Inventory Qty",
    "Variant Inventory Policy",
    "Variant Fulfillment Service",
    "Variant Price",
    "Variant Compare At Price",
    "Variant Requires Shipping",
    "Variant Taxable",
    "Variant Barcode",
    "Image Src",
    "Image Position",
    "Image Alt Text",
    "Gift Card",
    "SEO Title",
    "SEO Description",
    "Google Shopping / Google Product Category",
    "Google Shopping / Gender",
    "Google Shopping / Age Group",
    "Google Shopping / MPN",
    "Google Shopping / AdWords Grouping",
    "Google Shopping / AdWords Labels",
    "Google Shopping / Condition",
    "Google Shopping / Custom Product",
    "Google Shopping / Custom Label 0",
    "Google Shopping / Custom Label 1",
    "Google Shopping / Custom Label 2",
    "Google Shopping / Custom Label 3",
    "Google Shopping / Custom Label 4",
    "Variant Image",
    "Variant Weight Unit",
    "Variant Tax Code",
    "Cost per item",
    "Status",
];

const SHOPIFY_PRODUCT_CATEGORY: &str = "Health & Beauty > Personal Care > Cosmetics";
const GOOGLE_PRODUCT_CATEGORY: &str = "Health & Beauty > Personal Care > Cosmetics > Skin Care";

/// Loads every `stock` decision and renders the CSV. Returns the CSV text and
/// the number of product rows.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the query fails or
/// [`PipelineError::Csv`] if rendering fails.
pub async fn export_stocked_csv(
    pool: &PgPool,
    vendor: &str,
) -> Result<(String, usize), PipelineError> {
    let rows = cgintel_db::list_stock_export_rows(pool).await?;
    let csv = render_shopify_csv(&rows, vendor)?;
    tracing::info!(rows = rows.len(), "rendered Shopify export");
    Ok((csv, rows.len()))
}

/// Renders rows into a Shopify import CSV.
///
/// Rows are sorted by priority (urgent, high, medium, low, unset), then by
/// case-folded display name and hash, regardless of input order.
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if a record cannot be written.
pub fn render_shopify_csv(rows: &[StockExportRow], vendor: &str) -> Result<String, PipelineError> {
    let mut sorted: Vec<&StockExportRow> = rows.iter().collect();
    sorted.sort_by_cached_key(|row| {
        (
            priority_rank(row),
            row.display_name.to_lowercase(),
            row.product_hash.clone(),
        )
    });

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SHOPIFY_COLUMNS)?;
    for row in sorted {
        writer.write_record(shopify_record(row, vendor))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Other(format!("flushing CSV: {}", e.error())))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::Other(format!("CSV is not UTF-8: {e}")))
}

fn priority_rank(row: &StockExportRow) -> u8 {
    Priority::rank(row.priority.as_deref().and_then(|p| p.parse().ok()))
}

fn shopify_record(row: &StockExportRow, vendor: &str) -> [String; 49] {
    let tier = row.price_tier.as_deref().and_then(|t| t.parse::<PriceTier>().ok());
    let price = row
        .decision_retail_price
        .or(row.catalog_retail_price)
        .unwrap_or_else(|| tier_default_price(tier.unwrap_or(PriceTier::Mid)));
    let product_type = row.product_type.clone().unwrap_or_default();
    let category = row.category.clone().unwrap_or_default();
    let tier_label = tier.map(PriceTier::as_str).unwrap_or_default();
    let image = row.image_url.clone().unwrap_or_default();
    let has_image = !image.is_empty();

    [
        shopify_handle(&row.display_name, &row.product_hash),
        row.display_name.clone(),
        body_html(row),
        vendor.to_string(),
        SHOPIFY_PRODUCT_CATEGORY.to_string(),
        product_type,
        tags(row, tier_label),
        "TRUE".to_string(),
        "Title".to_string(),
        "Default Title".to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        sku(&row.product_hash),
        "0".to_string(),
        "shopify".to_string(),
        row.initial_quantity.unwrap_or(0).to_string(),
        "deny".to_string(),
        row.fulfillment_method
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "manual".to_string()),
        format_money(price),
        String::new(),
        "TRUE".to_string(),
        "TRUE".to_string(),
        String::new(),
        image,
        if has_image { "1".to_string() } else { String::new() },
        if has_image { row.display_name.clone() } else { String::new() },
        "FALSE".to_string(),
        seo_title(&row.display_name, vendor),
        seo_description(row, vendor),
        GOOGLE_PRODUCT_CATEGORY.to_string(),
        "unisex".to_string(),
        "adult".to_string(),
        row.product_hash.clone(),
        category.clone(),
        tier_label.to_string(),
        "new".to_string(),
        "FALSE".to_string(),
        tier_label.to_string(),
        row.priority.clone().unwrap_or_default(),
        category,
        String::new(),
        String::new(),
        String::new(),
        "g".to_string(),
        String::new(),
        row.wholesale_price.map(format_money).unwrap_or_default(),
        "active".to_string(),
    ]
}

/// URL handle: a lowercase ASCII slug of the name plus the first six hash
/// characters, so identically named products stay distinct.
#[must_use]
pub fn shopify_handle(display_name: &str, product_hash: &str) -> String {
    let mut slug = String::with_capacity(display_name.len());
    for c in display_name.to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' => slug.push(c),
            'ä' | 'à' | 'á' | 'â' => slug.push('a'),
            'é' | 'è' | 'ê' | 'ë' => slug.push('e'),
            'ö' | 'ó' | 'ô' => slug.push('o'),
            'ü' | 'ú' | 'û' => slug.push('u'),
            'í' | 'î' | 'ï' => slug.push('i'),
            'ç' => slug.push('c'),
            'ß' => slug.push_str("ss"),
            '\'' | '’' => {}
            _ => slug.push('-'),
        }
    }
    let slug = slug
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let suffix: String = product_hash.chars().take(6).collect();

    if slug.is_empty() {
        format!("product-{suffix}")
    } else {
        format!("{slug}-{suffix}")
    }
}

fn sku(product_hash: &str) -> String {
    let short: String = product_hash.chars().take(8).collect();
    format!("CG-{}", short.to_ascii_uppercase())
}

fn tags(row: &StockExportRow, tier_label: &str) -> String {
    let mut tags: Vec<String> = Vec::new();
    let candidates = [row.category.as_deref(), row.product_type.as_deref(), Some(tier_label)];
    for tag in candidates.into_iter().flatten().chain(row.key_actives.iter().map(String::as_str)) {
        let tag = tag.trim().replace('_', " ");
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.join(", ")
}

fn body_html(row: &StockExportRow) -> String {
    let mut body = format!("<p>{}</p>", escape_html(&row.display_name));
    if !row.key_actives.is_empty() {
        body.push_str(&format!(
            "<p><strong>Key actives:</strong> {}</p>",
            escape_html(&human_list(&row.key_actives))
        ));
    }
    if !row.suitable_for.is_empty() {
        body.push_str(&format!(
            "<p><strong>Suitable for:</strong> {}</p>",
            escape_html(&human_list(&row.suitable_for))
        ));
    }
    body
}

fn seo_title(display_name: &str, vendor: &str) -> String {
    truncate(&format!("{display_name} | {vendor}"), SEO_TITLE_MAX_CHARS)
}

fn seo_description(row: &StockExportRow, vendor: &str) -> String {
    let mut text = row.display_name.clone();
    if let Some(product_type) = row.product_type.as_deref().filter(|t| !t.is_empty()) {
        text.push_str(&format!(" - {product_type}"));
    }
    if !row.key_actives.is_empty() {
        text.push_str(&format!(" with {}", human_list(&row.key_actives)));
    }
    text.push('.');
    if !row.suitable_for.is_empty() {
        text.push_str(&format!(" Suitable for {}.", human_list(&row.suitable_for)));
    }
    text.push_str(&format!(" Shop now at {vendor}."));
    truncate(&text, SEO_DESCRIPTION_MAX_CHARS)
}

fn human_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| i.replace('_', " "))
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn format_money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;

//! Secondary image lookup used by the enrichment sweep.

use crate::client::{build_url, ScraperClient};
use crate::error::ScraperError;
use crate::types::ObfSearchResponse;

const IMAGE_FIELDS: &str = "code,product_name,image_url,image_front_url,image_small_url";
const IMAGE_SEARCH_PAGE_SIZE: &str = "5";

/// An image found for a product together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHit {
    pub image_url: String,
    /// OBF product page of the hit, `{base}/product/<code>`.
    pub source_url: Option<String>,
}

/// Searches Open Beauty Facts by product name and returns the first hit that
/// carries any image field.
///
/// # Errors
///
/// Returns [`ScraperError`] if the search request fails. An empty result set
/// is `Ok(None)`.
pub async fn search_image(
    client: &ScraperClient,
    base_url: &str,
    product_name: &str,
) -> Result<Option<ImageHit>, ScraperError> {
    let name = product_name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let url = build_url(
        base_url,
        "/cgi/search.pl",
        &[
            ("search_terms", name),
            ("search_simple", "1"),
            ("action", "process"),
            ("json", "1"),
            ("page_size", IMAGE_SEARCH_PAGE_SIZE),
            ("fields", IMAGE_FIELDS),
        ],
    )?;
    let response: ObfSearchResponse = client
        .get_json(&url, &format!("OBF image search for \"{name}\""))
        .await?;

    let hit = response.products.iter().find_map(|product| {
        let image_url = product.best_image()?.to_string();
        let source_url = product
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .and_then(|code| build_url(base_url, &format!("/product/{code}"), &[]).ok());
        Some(ImageHit {
            image_url,
            source_url,
        })
    });

    Ok(hit)
}

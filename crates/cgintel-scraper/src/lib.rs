//! HTTP collectors for external product catalogs.
//!
//! Every collector returns a [`CollectOutcome`]: the records gathered so far
//! plus one error string per page loop that ended early. Nothing here writes
//! to the database; staging and promotion live in `cgintel-pipeline`.

pub mod amazon;
pub mod client;
pub mod error;
pub mod image_search;
pub mod obf;
pub mod parse;
pub mod types;

pub use amazon::{
    collect_amazon, parse_detail_page, parse_search_page, AmazonQuery, ProductDetail,
    DEFAULT_AMAZON_QUERIES, DETAIL_PAGES_PER_QUERY,
};
pub use client::ScraperClient;
pub use error::ScraperError;
pub use image_search::{search_image, ImageHit};
pub use obf::{collect_obf, staging_from_obf, DEFAULT_OBF_CATEGORIES, OBF_PAGE_SIZE};
pub use types::{clamp_pages, CollectOutcome, ObfProduct, ObfSearchResponse, MAX_PAGES};

use super::*;
use rust_decimal::Decimal;

const BASE: &str = "https://www.amazon.de";

fn card(asin: &str, title: &str, price: &str) -> String {
    format!(
        r#"<div data-asin="{asin}" data-component-type="s-search-result" class="s-result-item">
  <img class="s-image" src="https://m.media-amazon.test/{asin}.jpg" alt="">
  <span class="a-size-base-plus a-color-base">CeraVe</span>
  <h2 class="a-size-mini"><a href="/dp/{asin}"><span class="a-size-base-plus a-text-normal">{title}</span></a></h2>
  <span aria-label="4,6 von 5 Sternen"><i class="a-icon-star-small"></i></span>
  <span aria-label="12.345 Bewertungen"><span class="s-underline-text">12.345</span></span>
  <span class="a-price"><span class="a-offscreen">{price}</span></span>
</div>"#
    )
}

#[test]
fn parses_all_card_fields() {
    let html = card("B07C5SS6YF", "CeraVe Feuchtigkeitscreme 340g", "14,95&nbsp;€");
    let records = parse_search_page(BASE, "moisturizers", &html);

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.external_id.as_deref(), Some("B07C5SS6YF"));
    assert_eq!(record.name, "CeraVe Feuchtigkeitscreme 340g");
    assert_eq!(record.brand.as_deref(), Some("CeraVe"));
    assert_eq!(record.price, Some(Decimal::new(1495, 2)));
    assert_eq!(record.currency.as_deref(), Some("EUR"));
    assert_eq!(record.rating, Some(4.6));
    assert_eq!(record.review_count, Some(12345));
    assert_eq!(
        record.image_url.as_deref(),
        Some("https://m.media-amazon.test/B07C5SS6YF.jpg")
    );
    assert_eq!(
        record.source_url.as_deref(),
        Some("https://www.amazon.de/dp/B07C5SS6YF")
    );
    assert_eq!(record.category.as_deref(), Some("moisturizers"));
}

#[test]
fn english_rating_text_is_understood() {
    let html = card("B000000001", "Serum", "$34.00").replace("4,6 von 5 Sternen", "4.1 out of 5 stars");
    let records = parse_search_page(BASE, "serums", &html);
    assert_eq!(records[0].rating, Some(4.1));
    assert_eq!(records[0].price, Some(Decimal::new(3400, 2)));
}

#[test]
fn skips_cards_without_asin_or_title() {
    let html = format!(
        "{}{}{}",
        r#"<div data-asin="" class="s-result-item"><h2><span>Sponsored</span></h2></div>"#,
        r#"<div data-asin="B0NOTITLE1" class="s-result-item"><img class="s-image" src="x.jpg"></div>"#,
        card("B0TITLED01", "Niacinamide 10% + Zinc 1%", "6,50 €"),
    );
    let records = parse_search_page(BASE, "serums", &html);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].external_id.as_deref(), Some("B0TITLED01"));
}

#[test]
fn collapses_repeated_asins() {
    let html = format!(
        "{}{}",
        card("B0DUPLICAT", "Hyaluron Serum", "9,99 €"),
        card("B0DUPLICAT", "Hyaluron Serum", "9,99 €"),
    );
    assert_eq!(parse_search_page(BASE, "serums", &html).len(), 1);
}

#[test]
fn brand_falls_back_to_first_title_word() {
    let html = card("B0NOBRAND1", "Nivea Soft Creme", "3,45 €")
        .replace(r#"<span class="a-size-base-plus a-color-base">CeraVe</span>"#, "");
    let records = parse_search_page(BASE, "moisturizers", &html);
    assert_eq!(records[0].brand.as_deref(), Some("Nivea"));
}

#[test]
fn missing_price_leaves_currency_empty() {
    let html = card("B0NOPRICE1", "Shampoo Repair", "");
    let records = parse_search_page(BASE, "shampoo_conditioner", &html);
    assert!(records[0].price.is_none());
    assert!(records[0].currency.is_none());
}

#[test]
fn title_entities_are_decoded() {
    let html = card("B0ENTITY01", "L&#39;Or&#233;al Revitalift &amp; Filler", "19,99 €");
    let records = parse_search_page(BASE, "serums", &html);
    assert_eq!(records[0].name, "L'Oréal Revitalift & Filler");
}

#[test]
fn default_queries_keep_order() {
    let queries = AmazonQuery::defaults();
    assert_eq!(queries.len(), 4);
    assert_eq!(queries[0].query, "gesichtsserum");
    assert_eq!(queries[3].category, "fragrances");
}

#[test]
fn attr_value_ignores_prefixed_names() {
    let tag = r#"<img data-src="lazy.jpg" src="real.jpg" class="s-image">"#;
    assert_eq!(attr_value(&SRC_ATTR_RE, tag).as_deref(), Some("real.jpg"));
    assert_eq!(attr_value(&CLASS_ATTR_RE, tag).as_deref(), Some("s-image"));
}

#[test]
fn detail_page_reads_ingredient_table_and_hires_image() {
    let html = r#"<div id="imgTagWrapperId">
  <img alt="" src="https://m.media-amazon.test/small.jpg" data-old-hires="https://m.media-amazon.test/big.jpg" id="landingImage">
</div>
<table id="productDetails_techSpec_section_1">
  <tr><th class="a-color-secondary">Marke</th><td>CeraVe</td></tr>
  <tr><th class="a-color-secondary"> Inhaltsstoffe </th><td>Aqua, Glycerin, Niacinamide, Ceramide NP</td></tr>
</table>"#;
    let detail = parse_detail_page(html);
    assert_eq!(
        detail.ingredients.as_deref(),
        Some("Aqua, Glycerin, Niacinamide, Ceramide NP")
    );
    assert_eq!(
        detail.image_url.as_deref(),
        Some("https://m.media-amazon.test/big.jpg")
    );
}

#[test]
fn detail_page_falls_back_to_important_information() {
    let html = r#"<img id="landingImage" src="https://m.media-amazon.test/main.jpg">
<div id="important-information" class="a-section">
  <div class="a-section content"><h4>Ingredients:</h4><p>Water, Salicylic Acid, Zinc PCA</p></div>
</div>"#;
    let detail = parse_detail_page(html);
    assert_eq!(
        detail.ingredients.as_deref(),
        Some("Water, Salicylic Acid, Zinc PCA")
    );
    assert_eq!(
        detail.image_url.as_deref(),
        Some("https://m.media-amazon.test/main.jpg")
    );
}

#[test]
fn detail_page_without_fields_is_empty() {
    assert_eq!(
        parse_detail_page("<html><body>Robot check</body></html>"),
        ProductDetail::default()
    );
}

#[test]
fn detail_keeps_existing_ingredients_and_replaces_thumbnail() {
    let mut record =
        parse_search_page(BASE, "serums", &card("B0DETAIL01", "Serum", "9,99 €")).remove(0);
    ProductDetail {
        ingredients: Some("Aqua, Retinol".to_string()),
        image_url: Some("https://m.media-amazon.test/big.jpg".to_string()),
    }
    .apply_to(&mut record);
    assert_eq!(record.ingredients.as_deref(), Some("Aqua, Retinol"));
    assert_eq!(
        record.image_url.as_deref(),
        Some("https://m.media-amazon.test/big.jpg")
    );

    ProductDetail {
        ingredients: Some("Other".to_string()),
        image_url: None,
    }
    .apply_to(&mut record);
    assert_eq!(record.ingredients.as_deref(), Some("Aqua, Retinol"));
    assert_eq!(
        record.image_url.as_deref(),
        Some("https://m.media-amazon.test/big.jpg")
    );
}

use super::*;

fn row(hash: &str, name: &str, priority: Option<&str>) -> StockExportRow {
    StockExportRow {
        product_hash: hash.to_string(),
        display_name: name.to_string(),
        category: Some("serums".to_string()),
        product_type: Some("serum".to_string()),
        price_tier: Some("premium".to_string()),
        key_actives: vec!["niacinamide".to_string(), "hyaluronic_acid".to_string()],
        suitable_for: vec!["dryness".to_string()],
        catalog_retail_price: Some(Decimal::new(3499, 2)),
        image_url: Some("https://img.test/a.jpg".to_string()),
        decision_retail_price: None,
        initial_quantity: Some(12),
        fulfillment_method: None,
        priority: priority.map(str::to_string),
        acquisition_lead: Some("ACQ-ABCDEF01".to_string()),
        wholesale_price: Some(Decimal::new(10, 0)),
    }
}

fn parse(csv_text: &str) -> Vec<csv::StringRecord> {
    csv::Reader::from_reader(csv_text.as_bytes())
        .records()
        .collect::<Result<_, _>>()
        .expect("valid csv")
}

fn column(name: &str) -> usize {
    SHOPIFY_COLUMNS
        .iter()
        .position(|c| *c == name)
        .expect("known column")
}

#[test]
fn header_has_49_columns() {
    let text = render_shopify_csv(&[], "CrazyGels").unwrap();
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 49);
    assert_eq!(&headers[0], "Handle");
    assert_eq!(&headers[48], "Status");
}

#[test]
fn every_row_has_49_fields() {
    let text = render_shopify_csv(&[row("aaaaaaaaaaaaaaaa", "Serum", None)], "CrazyGels").unwrap();
    let records = parse(&text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].len(), 49);
}

#[test]
fn title_with_comma_and_quote_is_escaped() {
    let text = render_shopify_csv(
        &[row("aaaaaaaaaaaaaaaa", r#"My "Favorite" Serum, 50ml"#, None)],
        "CrazyGels",
    )
    .unwrap();

    assert!(
        text.contains(r#","My ""Favorite"" Serum, 50ml","#),
        "title not quoted as expected:\n{text}"
    );
    let records = parse(&text);
    assert_eq!(&records[0][column("Title")], r#"My "Favorite" Serum, 50ml"#);
}

#[test]
fn rows_sorted_by_priority_then_name() {
    let rows = vec![
        row("1111111111111111", "Zinc Toner", None),
        row("2222222222222222", "Alpha Serum", Some("low")),
        row("3333333333333333", "Beta Cream", Some("urgent")),
        row("4444444444444444", "Acne Gel", Some("urgent")),
        row("5555555555555555", "Mask", Some("high")),
    ];
    let text = render_shopify_csv(&rows, "CrazyGels").unwrap();
    let titles: Vec<String> = parse(&text)
        .iter()
        .map(|r| r[column("Title")].to_string())
        .collect();
    assert_eq!(
        titles,
        vec!["Acne Gel", "Beta Cream", "Mask", "Alpha Serum", "Zinc Toner"]
    );
}

#[test]
fn name_order_ignores_case() {
    let rows = vec![
        row("1111111111111111", "Zinc Toner", Some("medium")),
        row("2222222222222222", "aloe gel", Some("medium")),
        row("3333333333333333", "Bakuchiol Oil", Some("medium")),
    ];
    let text = render_shopify_csv(&rows, "CrazyGels").unwrap();
    let titles: Vec<String> = parse(&text)
        .iter()
        .map(|r| r[column("Title")].to_string())
        .collect();
    assert_eq!(titles, vec!["aloe gel", "Bakuchiol Oil", "Zinc Toner"]);
}

#[test]
fn decision_price_wins_over_catalog_price() {
    let mut stocked = row("aaaaaaaaaaaaaaaa", "Serum", None);
    stocked.decision_retail_price = Some(Decimal::new(2990, 2));
    let text = render_shopify_csv(&[stocked], "CrazyGels").unwrap();
    assert_eq!(&parse(&text)[0][column("Variant Price")], "29.90");
}

#[test]
fn tier_price_used_when_no_price_is_known() {
    let mut stocked = row("aaaaaaaaaaaaaaaa", "Serum", None);
    stocked.catalog_retail_price = None;
    stocked.price_tier = Some("luxury".to_string());
    let text = render_shopify_csv(&[stocked], "CrazyGels").unwrap();
    assert_eq!(&parse(&text)[0][column("Variant Price")], "59.99");
}

#[test]
fn seo_fields_are_truncated() {
    let long_name = "Ultra Hydrating Overnight Recovery Serum With Ceramides And Peptides 50ml";
    let text = render_shopify_csv(&[row("aaaaaaaaaaaaaaaa", long_name, None)], "CrazyGels").unwrap();
    let records = parse(&text);
    let record = &records[0];

    assert_eq!(record[column("SEO Title")].chars().count(), SEO_TITLE_MAX_CHARS);
    assert!(record[column("SEO Description")].chars().count() <= SEO_DESCRIPTION_MAX_CHARS);
    assert!(record[column("SEO Description")].starts_with(long_name));
}

#[test]
fn short_seo_title_is_templated() {
    let text = render_shopify_csv(&[row("aaaaaaaaaaaaaaaa", "Serum", None)], "CrazyGels").unwrap();
    let records = parse(&text);
    let record = &records[0];
    assert_eq!(&record[column("SEO Title")], "Serum | CrazyGels");
    assert_eq!(
        &record[column("SEO Description")],
        "Serum - serum with niacinamide, hyaluronic acid. Suitable for dryness. Shop now at CrazyGels."
    );
}

#[test]
fn variant_fields_have_defaults() {
    let text = render_shopify_csv(&[row("abcdef0123456789", "Serum", None)], "CrazyGels").unwrap();
    let records = parse(&text);
    let record = &records[0];
    assert_eq!(&record[column("Variant SKU")], "CG-ABCDEF01");
    assert_eq!(&record[column("Variant Inventory Qty")], "12");
    assert_eq!(&record[column("Variant Fulfillment Service")], "manual");
    assert_eq!(&record[column("Cost per item")], "10.00");
    assert_eq!(&record[column("Vendor")], "CrazyGels");
    assert_eq!(&record[column("Image Position")], "1");
    assert_eq!(&record[column("Tags")], "serums, serum, premium, niacinamide, hyaluronic acid");
}

#[test]
fn handle_slugifies_and_appends_hash() {
    assert_eq!(
        shopify_handle("L'Oréal Revitalift Sérum 30ml", "abcdef0123456789"),
        "loreal-revitalift-serum-30ml-abcdef"
    );
    assert_eq!(
        shopify_handle("Niacinamide 10% + Zinc 1%", "0011223344556677"),
        "niacinamide-10-zinc-1-001122"
    );
    assert_eq!(shopify_handle("!!!", "0011223344556677"), "product-001122");
}

#[test]
fn body_html_escapes_markup() {
    let mut stocked = row("aaaaaaaaaaaaaaaa", "Serum <b>&</b>", None);
    stocked.suitable_for.clear();
    let body = body_html(&stocked);
    assert_eq!(
        body,
        "<p>Serum &lt;b&gt;&amp;&lt;/b&gt;</p><p><strong>Key actives:</strong> niacinamide, hyaluronic acid</p>"
    );
}

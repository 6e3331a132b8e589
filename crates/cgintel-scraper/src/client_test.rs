use super::*;

#[test]
fn build_url_appends_encoded_query() {
    let url = build_url(
        "https://www.amazon.de",
        "/s",
        &[("k", "gesichtscreme feuchtigkeitspflege"), ("page", "2")],
    )
    .unwrap();
    assert_eq!(
        url,
        "https://www.amazon.de/s?k=gesichtscreme+feuchtigkeitspflege&page=2"
    );
}

#[test]
fn build_url_strips_trailing_slash_from_base() {
    let url = build_url("https://world.openbeautyfacts.org/", "/product/123", &[]).unwrap();
    assert_eq!(url, "https://world.openbeautyfacts.org/product/123");
}

#[test]
fn build_url_encodes_tag_colons() {
    let url = build_url(
        "https://world.openbeautyfacts.org",
        "/api/v2/search",
        &[("categories_tags", "en:face-serums")],
    )
    .unwrap();
    assert!(
        url.contains("categories_tags=en%3Aface-serums"),
        "unexpected url: {url}"
    );
}

#[test]
fn build_url_rejects_relative_base() {
    let result = build_url("not-a-url", "/s", &[]);
    assert!(
        matches!(result, Err(ScraperError::InvalidUrl { .. })),
        "expected InvalidUrl, got: {result:?}"
    );
}

#[tokio::test]
async fn pause_with_zero_delay_returns_immediately() {
    let client = ScraperClient::new(5, "cgintel-test/0.1", 0).expect("client");
    let started = std::time::Instant::now();
    client.pause().await;
    assert!(started.elapsed() < std::time::Duration::from_millis(50));
}

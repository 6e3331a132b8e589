//! Text helpers shared by the collectors: prices, ratings, review counts and
//! HTML text cleanup.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid regex"));

static FRACTIONAL_RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[.,]\d+)").expect("valid regex"));

static WHOLE_RATING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("valid regex"));

static COUNT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,\u{a0}\u{202f}]*").expect("valid regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#\d+|[a-zA-Z]+);").expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Parses a display price such as `"29,90 €"`, `"1.234,56"` or `"$34.00"`.
///
/// The last separator followed by one or two digits is the decimal mark;
/// every other separator groups thousands. Returns `None` for text without a
/// positive number.
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let token = NUMBER_TOKEN.find(text)?.as_str();
    let token = token.trim_end_matches(['.', ',']);

    let decimal_at = token
        .rfind(['.', ','])
        .filter(|&idx| matches!(token.len() - idx - 1, 1 | 2));

    let normalized: String = match decimal_at {
        Some(idx) => {
            let whole: String = token[..idx].chars().filter(char::is_ascii_digit).collect();
            format!("{whole}.{}", &token[idx + 1..])
        }
        None => token.chars().filter(char::is_ascii_digit).collect(),
    };

    let value: Decimal = normalized.parse().ok()?;
    (value > Decimal::ZERO).then_some(value)
}

/// Parses a star rating from text like `"4,5 von 5 Sternen"` or
/// `"4.2 out of 5 stars"`. Whole numbers are accepted only within `1..=5`.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f64> {
    if let Some(caps) = FRACTIONAL_RATING.captures(text) {
        let value: f64 = caps[1].replace(',', ".").parse().ok()?;
        return (0.0..=5.0).contains(&value).then_some(value);
    }

    let caps = WHOLE_RATING.captures(text)?;
    let value: u8 = caps[1].parse().ok()?;
    (1..=5).contains(&value).then_some(f64::from(value))
}

/// Parses a review count such as `"1.234"`, `"(2,051)"` or
/// `"12 345 Bewertungen"` into an integer.
#[must_use]
pub fn parse_review_count(text: &str) -> Option<i32> {
    let token = COUNT_TOKEN.find(text)?.as_str();
    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Decodes the HTML entities that show up in product titles.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    let decoded = match entity {
        "amp" => "&",
        "quot" => "\"",
        "apos" => "'",
        "lt" => "<",
        "gt" => ">",
        "nbsp" => " ",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Strips tags, decodes entities and collapses whitespace.
#[must_use]
pub fn clean_text(html: &str) -> String {
    let without_tags = TAG.replace_all(html, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Truncates to at most `max_chars` characters on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;

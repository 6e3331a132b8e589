//! Stable cross-table identity for scraped products.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest (64 bits).
pub const PRODUCT_HASH_LEN: usize = 16;

/// Derives the `product_hash` shared by staging, catalog, stocking and
/// sourcing rows.
///
/// The digest input is `"{source}:{external_id_or_name}:{name}"`. Truncation
/// to 64 bits is assumed collision-free at catalog scale; two inputs that do
/// collide are treated as the same logical product.
#[must_use]
pub fn product_hash(source: &str, external_id_or_name: &str, name: &str) -> String {
    let input = format!("{source}:{external_id_or_name}:{name}");
    let mut hex = format!("{:x}", Sha256::digest(input.as_bytes()));
    hex.truncate(PRODUCT_HASH_LEN);
    hex
}

/// Internal acquisition code for a product, e.g. `"ACQ-1A2B3C4D"`.
#[must_use]
pub fn acquisition_lead(product_hash: &str) -> String {
    let prefix: String = product_hash.chars().take(8).collect();
    format!("ACQ-{}", prefix.to_uppercase())
}

/// Returns `true` if `value` has the shape of a `product_hash`.
#[must_use]
pub fn is_valid_product_hash(value: &str) -> bool {
    value.len() == PRODUCT_HASH_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_hash_is_deterministic() {
        let a = product_hash("open_beauty_facts", "3600523614455", "Revitalift Serum");
        let b = product_hash("open_beauty_facts", "3600523614455", "Revitalift Serum");
        assert_eq!(a, b);
    }

    #[test]
    fn product_hash_is_sixteen_lowercase_hex_chars() {
        let hash = product_hash("amazon_de", "B07XYZ1234", "Niacinamide 10% + Zinc 1%");
        assert_eq!(hash.len(), PRODUCT_HASH_LEN);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn product_hash_matches_known_digest_prefix() {
        let full = format!("{:x}", Sha256::digest(b"a:b:c"));
        assert_eq!(product_hash("a", "b", "c"), full[..16]);
    }

    #[test]
    fn product_hash_differs_per_source() {
        let obf = product_hash("open_beauty_facts", "123", "Serum");
        let amazon = product_hash("amazon_de", "123", "Serum");
        assert_ne!(obf, amazon);
    }

    #[test]
    fn acquisition_lead_uses_uppercased_prefix() {
        assert_eq!(acquisition_lead("1a2b3c4d5e6f7a8b"), "ACQ-1A2B3C4D");
    }

    #[test]
    fn is_valid_product_hash_checks_length_and_alphabet() {
        assert!(is_valid_product_hash("0123456789abcdef"));
        assert!(!is_valid_product_hash("0123456789abcde"));
        assert!(!is_valid_product_hash("0123456789abcdeg"));
    }
}

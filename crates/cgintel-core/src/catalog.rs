use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Coarse price bucket used for default pricing and margin estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Budget,
    Mid,
    Premium,
    Luxury,
}

impl PriceTier {
    pub const ALL: [PriceTier; 4] = [
        PriceTier::Budget,
        PriceTier::Mid,
        PriceTier::Premium,
        PriceTier::Luxury,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PriceTier::Budget => "budget",
            PriceTier::Mid => "mid",
            PriceTier::Premium => "premium",
            PriceTier::Luxury => "luxury",
        }
    }
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "budget" => Ok(PriceTier::Budget),
            "mid" => Ok(PriceTier::Mid),
            "premium" => Ok(PriceTier::Premium),
            "luxury" => Ok(PriceTier::Luxury),
            other => Err(CoreError::InvalidPriceTier(other.to_string())),
        }
    }
}

/// Lifecycle of a catalog row. The only transition is `research -> listed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    Research,
    Listed,
}

impl CatalogStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogStatus::Research => "research",
            CatalogStatus::Listed => "listed",
        }
    }
}

impl std::fmt::Display for CatalogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "research" => Ok(CatalogStatus::Research),
            "listed" => Ok(CatalogStatus::Listed),
            other => Err(CoreError::InvalidCatalogStatus(other.to_string())),
        }
    }
}

/// The mutable column set of a `product_catalog` row.
///
/// Used both for what is stored and for what a promotion or enrichment
/// wants to write; `None` and empty lists mean "no value".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFields {
    pub display_name: Option<String>,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub price_tier: Option<PriceTier>,
    /// Quality signal in `0.0..=1.0`.
    pub efficacy_score: Option<f64>,
    pub key_actives: Vec<String>,
    pub suitable_for: Vec<String>,
    pub contraindications: Vec<String>,
    pub retail_price: Option<Decimal>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub status: Option<CatalogStatus>,
}

/// Fill-if-missing merge of an incoming write onto a stored row.
///
/// `category`, `product_type`, `price_tier` and `status` are sticky: once
/// the stored row has a value, it wins. Every other field takes the incoming
/// value when one is present and otherwise keeps the stored value, so a
/// partial write never clears a populated column.
///
/// With no stored row the incoming fields are returned as-is, with `status`
/// defaulting to `research`.
#[must_use]
pub fn merge_catalog(existing: Option<&CatalogFields>, incoming: CatalogFields) -> CatalogFields {
    let Some(old) = existing else {
        return CatalogFields {
            status: incoming.status.or(Some(CatalogStatus::Research)),
            ..incoming
        };
    };

    CatalogFields {
        display_name: refresh(non_blank(incoming.display_name), &old.display_name),
        category: sticky(&old.category, non_blank(incoming.category)),
        product_type: sticky(&old.product_type, non_blank(incoming.product_type)),
        price_tier: old.price_tier.or(incoming.price_tier),
        efficacy_score: incoming.efficacy_score.or(old.efficacy_score),
        key_actives: refresh_list(incoming.key_actives, &old.key_actives),
        suitable_for: refresh_list(incoming.suitable_for, &old.suitable_for),
        contraindications: refresh_list(incoming.contraindications, &old.contraindications),
        retail_price: incoming.retail_price.or(old.retail_price),
        currency: refresh(non_blank(incoming.currency), &old.currency),
        image_url: refresh(non_blank(incoming.image_url), &old.image_url),
        source_url: refresh(non_blank(incoming.source_url), &old.source_url),
        status: old
            .status
            .or(incoming.status)
            .or(Some(CatalogStatus::Research)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn sticky(old: &Option<String>, new: Option<String>) -> Option<String> {
    match old {
        Some(v) if !v.trim().is_empty() => Some(v.clone()),
        _ => new,
    }
}

fn refresh(new: Option<String>, old: &Option<String>) -> Option<String> {
    new.or_else(|| old.clone())
}

fn refresh_list(new: Vec<String>, old: &[String]) -> Vec<String> {
    if new.is_empty() {
        old.to_vec()
    } else {
        new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> CatalogFields {
        CatalogFields {
            display_name: Some("Niacinamide 10% Serum".to_string()),
            category: Some("serums".to_string()),
            product_type: Some("serum".to_string()),
            price_tier: Some(PriceTier::Budget),
            efficacy_score: Some(0.9),
            key_actives: vec!["niacinamide".to_string()],
            suitable_for: vec!["acne".to_string()],
            contraindications: vec![],
            retail_price: Some(Decimal::new(899, 2)),
            currency: Some("EUR".to_string()),
            image_url: Some("https://img.example/a.jpg".to_string()),
            source_url: Some("https://world.openbeautyfacts.org/product/1".to_string()),
            status: Some(CatalogStatus::Research),
        }
    }

    #[test]
    fn merge_without_existing_defaults_status_to_research() {
        let merged = merge_catalog(
            None,
            CatalogFields {
                display_name: Some("Serum".to_string()),
                ..CatalogFields::default()
            },
        );
        assert_eq!(merged.status, Some(CatalogStatus::Research));
        assert_eq!(merged.display_name.as_deref(), Some("Serum"));
    }

    #[test]
    fn merge_partial_update_never_nulls_populated_fields() {
        let old = populated();
        let merged = merge_catalog(
            Some(&old),
            CatalogFields {
                efficacy_score: Some(0.4),
                ..CatalogFields::default()
            },
        );
        assert_eq!(merged.display_name, old.display_name);
        assert_eq!(merged.retail_price, old.retail_price);
        assert_eq!(merged.image_url, old.image_url);
        assert_eq!(merged.source_url, old.source_url);
        assert_eq!(merged.key_actives, old.key_actives);
        assert_eq!(merged.suitable_for, old.suitable_for);
        assert_eq!(merged.efficacy_score, Some(0.4));
    }

    #[test]
    fn merge_keeps_sticky_classification() {
        let old = populated();
        let merged = merge_catalog(
            Some(&old),
            CatalogFields {
                category: Some("moisturizers".to_string()),
                product_type: Some("moisturizer".to_string()),
                price_tier: Some(PriceTier::Luxury),
                status: Some(CatalogStatus::Research),
                ..CatalogFields::default()
            },
        );
        assert_eq!(merged.category.as_deref(), Some("serums"));
        assert_eq!(merged.product_type.as_deref(), Some("serum"));
        assert_eq!(merged.price_tier, Some(PriceTier::Budget));
    }

    #[test]
    fn merge_does_not_reset_listed_status() {
        let mut old = populated();
        old.status = Some(CatalogStatus::Listed);
        let merged = merge_catalog(
            Some(&old),
            CatalogFields {
                status: Some(CatalogStatus::Research),
                ..CatalogFields::default()
            },
        );
        assert_eq!(merged.status, Some(CatalogStatus::Listed));
    }

    #[test]
    fn merge_fills_missing_sticky_fields() {
        let old = CatalogFields {
            display_name: Some("Mystery Balm".to_string()),
            ..CatalogFields::default()
        };
        let merged = merge_catalog(
            Some(&old),
            CatalogFields {
                category: Some("skincare".to_string()),
                price_tier: Some(PriceTier::Mid),
                ..CatalogFields::default()
            },
        );
        assert_eq!(merged.category.as_deref(), Some("skincare"));
        assert_eq!(merged.price_tier, Some(PriceTier::Mid));
    }

    #[test]
    fn merge_refreshes_present_values() {
        let old = populated();
        let merged = merge_catalog(
            Some(&old),
            CatalogFields {
                image_url: Some("https://img.example/b.jpg".to_string()),
                key_actives: vec!["zinc".to_string()],
                ..CatalogFields::default()
            },
        );
        assert_eq!(merged.image_url.as_deref(), Some("https://img.example/b.jpg"));
        assert_eq!(merged.key_actives, vec!["zinc".to_string()]);
    }

    #[test]
    fn merge_treats_blank_strings_as_absent() {
        let old = populated();
        let merged = merge_catalog(
            Some(&old),
            CatalogFields {
                image_url: Some("   ".to_string()),
                ..CatalogFields::default()
            },
        );
        assert_eq!(merged.image_url, old.image_url);
    }

    #[test]
    fn price_tier_parses_case_insensitively() {
        assert_eq!("Premium".parse::<PriceTier>().unwrap(), PriceTier::Premium);
        assert!(matches!(
            "gold".parse::<PriceTier>(),
            Err(CoreError::InvalidPriceTier(_))
        ));
    }

    #[test]
    fn catalog_status_display_round_trips() {
        for status in [CatalogStatus::Research, CatalogStatus::Listed] {
            assert_eq!(status.to_string().parse::<CatalogStatus>().unwrap(), status);
        }
    }
}

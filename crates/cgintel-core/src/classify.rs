//! Heuristic classification tables.
//!
//! Every table is an ordered slice and lookups are first-match-wins, so the
//! outcome for an input that matches several entries is fixed by the order
//! written here.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::PriceTier;

/// Name keyword -> product type. German keywords cover the Amazon.de feed.
const PRODUCT_TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("serum", "serum"),
    ("sérum", "serum"),
    ("moisturiz", "moisturizer"),
    ("feuchtigk", "moisturizer"),
    ("creme", "moisturizer"),
    ("cream", "moisturizer"),
    ("cleanser", "cleanser"),
    ("reinig", "cleanser"),
    ("wash", "cleanser"),
    ("toner", "toner"),
    ("gesichtswasser", "toner"),
    ("mask", "mask"),
    ("maske", "mask"),
    ("sunscreen", "sunscreen"),
    ("spf", "sunscreen"),
    ("sonnenschutz", "sunscreen"),
    ("oil", "face_oil"),
    ("öl", "face_oil"),
    ("eye", "eye_cream"),
    ("augen", "eye_cream"),
    ("shampoo", "shampoo"),
    ("conditioner", "conditioner"),
    ("spülung", "conditioner"),
    ("parfum", "fragrance"),
    ("perfume", "fragrance"),
    ("eau de", "fragrance"),
    ("lip", "lip_care"),
    ("lippen", "lip_care"),
    ("nail", "nail_care"),
    ("nagel", "nail_care"),
    ("body", "body_care"),
    ("körper", "body_care"),
];

pub const DEFAULT_PRODUCT_TYPE: &str = "skincare";
pub const DEFAULT_CATEGORY: &str = "skincare";

const CATEGORY_BY_TYPE: &[(&str, &str)] = &[
    ("serum", "serums"),
    ("moisturizer", "moisturizers"),
    ("cleanser", "skincare"),
    ("toner", "toners"),
    ("mask", "face_masks"),
    ("sunscreen", "skincare"),
    ("face_oil", "skincare"),
    ("eye_cream", "skincare"),
    ("shampoo", "shampoo_conditioner"),
    ("conditioner", "shampoo_conditioner"),
    ("fragrance", "fragrances"),
    ("lip_care", "skincare"),
    ("nail_care", "nail_care"),
    ("body_care", "skincare"),
    ("skincare", "skincare"),
];

/// Brand key -> (tier, typical shelf price in EUR cents).
const BRAND_TIERS: &[(&str, PriceTier, i64)] = &[
    ("la mer", PriceTier::Luxury, 8500),
    ("chanel", PriceTier::Luxury, 8500),
    ("dior", PriceTier::Luxury, 8500),
    ("estée lauder", PriceTier::Luxury, 8500),
    ("lancôme", PriceTier::Luxury, 8500),
    ("sisley", PriceTier::Luxury, 8500),
    ("clinique", PriceTier::Premium, 4200),
    ("origins", PriceTier::Premium, 4200),
    ("shiseido", PriceTier::Premium, 4200),
    ("biotherm", PriceTier::Premium, 4200),
    ("clarins", PriceTier::Premium, 4200),
    ("cerave", PriceTier::Mid, 1400),
    ("neutrogena", PriceTier::Mid, 1400),
    ("nivea", PriceTier::Mid, 1400),
    ("garnier", PriceTier::Mid, 1400),
    ("l'oréal", PriceTier::Mid, 1400),
    ("the ordinary", PriceTier::Budget, 900),
    ("inkey", PriceTier::Budget, 900),
    ("revolution", PriceTier::Budget, 900),
];

/// Strength of the clinical backing behind an active ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Evidence {
    Proven,
    Emerging,
}

struct ActiveRule {
    keyword: &'static str,
    evidence: Evidence,
    concerns: &'static [&'static str],
}

const ACTIVES: &[ActiveRule] = &[
    ActiveRule { keyword: "niacinamide", evidence: Evidence::Proven, concerns: &["acne", "hyperpigmentation", "aging"] },
    ActiveRule { keyword: "vitamin c", evidence: Evidence::Proven, concerns: &["hyperpigmentation", "aging", "dullness"] },
    ActiveRule { keyword: "ascorbic acid", evidence: Evidence::Proven, concerns: &["hyperpigmentation", "aging", "dullness"] },
    ActiveRule { keyword: "retinol", evidence: Evidence::Proven, concerns: &["aging", "acne", "texture"] },
    ActiveRule { keyword: "retinal", evidence: Evidence::Emerging, concerns: &["aging", "acne", "texture"] },
    ActiveRule { keyword: "salicylic acid", evidence: Evidence::Proven, concerns: &["acne", "blackheads", "oily"] },
    ActiveRule { keyword: "hyaluronic acid", evidence: Evidence::Proven, concerns: &["dehydration", "dryness", "aging"] },
    ActiveRule { keyword: "glycolic acid", evidence: Evidence::Proven, concerns: &["texture", "dullness", "aging"] },
    ActiveRule { keyword: "lactic acid", evidence: Evidence::Proven, concerns: &["texture", "dryness", "sensitivity"] },
    ActiveRule { keyword: "azelaic acid", evidence: Evidence::Proven, concerns: &["acne", "rosacea", "hyperpigmentation"] },
    ActiveRule { keyword: "ceramide", evidence: Evidence::Proven, concerns: &["dryness", "sensitivity", "barrier_repair"] },
    ActiveRule { keyword: "peptide", evidence: Evidence::Emerging, concerns: &["aging", "firmness"] },
    ActiveRule { keyword: "squalane", evidence: Evidence::Proven, concerns: &["dryness", "sensitivity"] },
    ActiveRule { keyword: "zinc", evidence: Evidence::Proven, concerns: &["acne", "oily", "sensitivity"] },
    ActiveRule { keyword: "centella", evidence: Evidence::Proven, concerns: &["sensitivity", "redness", "barrier_repair"] },
    ActiveRule { keyword: "tea tree", evidence: Evidence::Proven, concerns: &["acne", "oily"] },
    ActiveRule { keyword: "bakuchiol", evidence: Evidence::Emerging, concerns: &["aging", "sensitivity"] },
    ActiveRule { keyword: "tranexamic acid", evidence: Evidence::Emerging, concerns: &["hyperpigmentation", "melasma"] },
    ActiveRule { keyword: "arbutin", evidence: Evidence::Proven, concerns: &["hyperpigmentation", "dullness"] },
    ActiveRule { keyword: "urea", evidence: Evidence::Proven, concerns: &["dryness", "texture"] },
    ActiveRule { keyword: "panthenol", evidence: Evidence::Proven, concerns: &["sensitivity", "barrier_repair"] },
    ActiveRule { keyword: "snail mucin", evidence: Evidence::Emerging, concerns: &["aging", "dehydration", "texture"] },
    ActiveRule { keyword: "propolis", evidence: Evidence::Emerging, concerns: &["acne", "sensitivity"] },
    ActiveRule { keyword: "collagen", evidence: Evidence::Emerging, concerns: &["aging", "firmness"] },
    ActiveRule { keyword: "aloe", evidence: Evidence::Proven, concerns: &["sensitivity", "hydration"] },
];

const CONTRAINDICATIONS: &[(&str, &[&str])] = &[
    ("retinol", &["pregnancy", "sensitive_skin_severe"]),
    ("retinal", &["pregnancy", "sensitive_skin_severe"]),
    ("salicylic acid", &["pregnancy"]),
    ("benzoyl peroxide", &["fungal_acne"]),
    ("glycolic acid", &["sensitive_skin_severe"]),
];

/// Used when no active ingredient names a concern.
const DEFAULT_SUITABLE_FOR: &[(&str, &[&str])] = &[
    ("serum", &["general_skincare"]),
    ("moisturizer", &["dryness", "dehydration"]),
    ("cleanser", &["general_skincare"]),
    ("toner", &["general_skincare"]),
    ("mask", &["general_skincare"]),
    ("shampoo", &["general_haircare"]),
    ("conditioner", &["general_haircare"]),
    ("nail_care", &["nail_care"]),
    ("fragrance", &["general_fragrance"]),
];

/// Classify a product name into a product type. Defaults to `skincare`.
#[must_use]
pub fn classify_product_type(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    PRODUCT_TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(DEFAULT_PRODUCT_TYPE, |(_, product_type)| product_type)
}

#[must_use]
pub fn category_for_product_type(product_type: &str) -> &'static str {
    CATEGORY_BY_TYPE
        .iter()
        .find(|(ptype, _)| *ptype == product_type)
        .map_or(DEFAULT_CATEGORY, |(_, category)| category)
}

/// Result of a brand-table lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierMatch {
    pub tier: PriceTier,
    /// Default retail price in EUR for products of this brand.
    pub price: Decimal,
    /// The table key that matched, or `None` for the default.
    pub matched_key: Option<&'static str>,
}

impl TierMatch {
    #[must_use]
    pub fn default_match() -> Self {
        Self {
            tier: PriceTier::Mid,
            price: Decimal::new(1999, 2),
            matched_key: None,
        }
    }
}

/// Look up a brand's price tier.
///
/// Matching is case-insensitive and bidirectional: an entry matches when
/// the brand contains the key or the key contains the brand. A blank or
/// missing brand never matches and yields `(mid, 19.99)`.
#[must_use]
pub fn lookup_brand_tier(brand: Option<&str>) -> TierMatch {
    let brand = brand.map(|b| b.trim().to_lowercase()).unwrap_or_default();
    if brand.is_empty() {
        return TierMatch::default_match();
    }

    BRAND_TIERS
        .iter()
        .find(|(key, _, _)| brand.contains(key) || key.contains(brand.as_str()))
        .map_or_else(TierMatch::default_match, |(key, tier, cents)| TierMatch {
            tier: *tier,
            price: Decimal::new(*cents, 2),
            matched_key: Some(key),
        })
}

/// Ingredient-derived attributes of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveProfile {
    pub key_actives: Vec<String>,
    pub suitable_for: Vec<String>,
    pub contraindications: Vec<String>,
    /// Matched actives with well-established clinical evidence.
    #[serde(skip)]
    pub proven_actives: u32,
    #[serde(skip)]
    pub emerging_actives: u32,
}

/// Detect actives, concerns and contraindications from free text
/// (typically the product name joined with its ingredient list).
///
/// Output lists keep table order and contain no duplicates.
#[must_use]
pub fn detect_actives(text: &str, product_type: &str) -> ActiveProfile {
    let lower = text.to_lowercase();
    let mut profile = ActiveProfile::default();

    for rule in ACTIVES.iter().filter(|r| lower.contains(r.keyword)) {
        profile.key_actives.push(rule.keyword.replace(' ', "_"));
        match rule.evidence {
            Evidence::Proven => profile.proven_actives += 1,
            Evidence::Emerging => profile.emerging_actives += 1,
        }
        for concern in rule.concerns {
            push_unique(&mut profile.suitable_for, concern);
        }
    }

    for (keyword, contras) in CONTRAINDICATIONS {
        if lower.contains(keyword) {
            for contra in *contras {
                push_unique(&mut profile.contraindications, contra);
            }
        }
    }

    if profile.suitable_for.is_empty() {
        let defaults = DEFAULT_SUITABLE_FOR
            .iter()
            .find(|(ptype, _)| *ptype == product_type)
            .map_or(&["general"][..], |(_, d)| *d);
        profile.suitable_for = defaults.iter().map(|s| (*s).to_string()).collect();
    }

    profile
}

/// Efficacy estimate on `0.0..=1.0`, rounded to three decimals.
///
/// Out of ten points: actives give up to 5 (1.2 per proven, 0.6 per
/// emerging), the star rating up to 3, and review volume up to 2 as a
/// confidence bonus (over 5, 20 and 100 reviews). `None` when the product has
/// no detected actives, no rating and no reviews.
#[must_use]
pub fn efficacy_score(
    profile: &ActiveProfile,
    rating: Option<f64>,
    review_count: Option<i32>,
) -> Option<f64> {
    let rating = rating.filter(|r| r.is_finite() && *r > 0.0).map(|r| r.min(5.0));
    let reviews = review_count.unwrap_or(0);
    if profile.proven_actives == 0
        && profile.emerging_actives == 0
        && rating.is_none()
        && reviews <= 0
    {
        return None;
    }

    let actives = (f64::from(profile.proven_actives) * 1.2
        + f64::from(profile.emerging_actives) * 0.6)
        .min(5.0);
    let rated = rating.map_or(0.0, |r| r / 5.0 * 3.0);
    let confidence = match reviews {
        n if n > 100 => 2.0,
        n if n > 20 => 1.0,
        n if n > 5 => 0.5,
        _ => 0.0,
    };

    let points = (actives + rated + confidence).min(10.0);
    Some((points * 100.0).round() / 1000.0)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;

/// Product pricing: either one flat price, or a base price plus a set of
/// named variants ("250gm", "500gm", ...) each carrying its own price.
#[derive(Debug, Clone, PartialEq)]
pub enum Pricing {
    Flat(BigDecimal),
    Variants {
        base: BigDecimal,
        prices: BTreeMap<String, BigDecimal>,
    },
}

impl Pricing {
    /// Build from the stored columns: a numeric base price and an optional
    /// JSONB mapping of variant label → price. Entries whose value is not a
    /// number (or numeric string) are skipped.
    pub fn from_parts(base: &BigDecimal, variants: Option<&serde_json::Value>) -> Pricing {
        let Some(serde_json::Value::Object(map)) = variants else {
            return Pricing::Flat(base.clone());
        };

        let prices: BTreeMap<String, BigDecimal> = map
            .iter()
            .filter_map(|(label, value)| {
                let price = match value {
                    serde_json::Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
                    serde_json::Value::String(s) => BigDecimal::from_str(s).ok(),
                    _ => None,
                }?;
                Some((label.clone(), price))
            })
            .collect();

        if prices.is_empty() {
            Pricing::Flat(base.clone())
        } else {
            Pricing::Variants {
                base: base.clone(),
                prices,
            }
        }
    }

    /// Resolve the effective unit price for a cart line. A variant price
    /// supersedes the base price only when the requested label is present in
    /// the mapping; anything else falls back to the base price.
    pub fn resolve_unit_price(&self, requested_variant: Option<&str>) -> BigDecimal {
        match self {
            Pricing::Flat(price) => price.clone(),
            Pricing::Variants { base, prices } => requested_variant
                .and_then(|label| prices.get(label))
                .cloned()
                .unwrap_or_else(|| base.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn flat_product_uses_base_price() {
        let pricing = Pricing::from_parts(&dec("12.50"), None);
        assert_eq!(pricing.resolve_unit_price(None), dec("12.50"));
        assert_eq!(pricing.resolve_unit_price(Some("500gm")), dec("12.50"));
    }

    #[test]
    fn selected_variant_supersedes_base_price() {
        let variants = json!({"250gm": 5, "500gm": 9});
        let pricing = Pricing::from_parts(&dec("5"), Some(&variants));
        assert_eq!(pricing.resolve_unit_price(Some("500gm")), dec("9"));
    }

    #[test]
    fn unknown_variant_falls_back_to_base_price() {
        let variants = json!({"250gm": 5, "500gm": 9});
        let pricing = Pricing::from_parts(&dec("5"), Some(&variants));
        assert_eq!(pricing.resolve_unit_price(Some("1kg")), dec("5"));
        assert_eq!(pricing.resolve_unit_price(None), dec("5"));
    }

    #[test]
    fn string_prices_in_variants_are_accepted() {
        let variants = json!({"250gm": "5.25"});
        let pricing = Pricing::from_parts(&dec("5"), Some(&variants));
        assert_eq!(pricing.resolve_unit_price(Some("250gm")), dec("5.25"));
    }

    #[test]
    fn empty_or_malformed_variants_degrade_to_flat() {
        let pricing = Pricing::from_parts(&dec("7"), Some(&json!({})));
        assert_eq!(pricing, Pricing::Flat(dec("7")));

        let pricing = Pricing::from_parts(&dec("7"), Some(&json!("oops")));
        assert_eq!(pricing, Pricing::Flat(dec("7")));

        let pricing = Pricing::from_parts(&dec("7"), Some(&json!({"500gm": [1, 2]})));
        assert_eq!(pricing, Pricing::Flat(dec("7")));
    }

    #[test]
    fn choco_ladoo_example() {
        // cart: 3 × choco-ladoo @ 500gm, variants {"250gm": 5, "500gm": 9}
        let variants = json!({"250gm": 5, "500gm": 9});
        let pricing = Pricing::from_parts(&dec("5"), Some(&variants));
        let unit = pricing.resolve_unit_price(Some("500gm"));
        assert_eq!(unit, dec("9"));
        assert_eq!(unit * BigDecimal::from(3), dec("27"));
    }
}

//! Canonical material-rate keys and defaults
//!
//! The rate store itself is a bare key/value mapping; everything that
//! knows which keys exist, how they group on screen, and what value a
//! missing key falls back to lives here. Default filling is a caller
//! responsibility — the store never invents values it does not hold.

use std::collections::BTreeMap;

/// Print-type rate keys, one per print finish a customer can order.
pub const PRINT_TYPE_KEYS: [&str; 6] = [
    "SINGLE_COLOUR_PRINTED",
    "DOUBLE_COLOUR_PRINTED",
    "THREE_COLOUR_PRINTED",
    "FOUR_COLOUR_PRINTED",
    "FULL_PRINT",
    "NATURAL",
];

/// Paste-type rate keys (the adhesive colour/paste family).
pub const PASTE_TYPE_KEYS: [&str; 4] = [
    "MILKY_WHITE",
    "BROWN_TAPE",
    "COLOR_TAPE",
    "TRANSPARENT",
];

/// Raw-material base rates.
pub const BASE_RATE_KEYS: [&str; 3] = ["PACKING_COST", "BOPP_FILM_RATE", "ADHESIVE_RATE"];

/// Remaining cost parameters (coating expense, profit percent,
/// adhesive-less credit rate).
pub const OTHER_RATE_KEYS: [&str; 3] = ["COATING_EXP", "PROFIT", "ADHESIVE_LESS_RATE"];

/// Every canonical rate key with its seed/default value.
pub const DEFAULT_RATES: [(&str, f64); 16] = [
    ("SINGLE_COLOUR_PRINTED", 150.0),
    ("DOUBLE_COLOUR_PRINTED", 225.0),
    ("THREE_COLOUR_PRINTED", 300.0),
    ("FOUR_COLOUR_PRINTED", 350.0),
    ("FULL_PRINT", 10.0),
    ("NATURAL", 0.0),
    ("MILKY_WHITE", 160.0),
    ("BROWN_TAPE", 105.0),
    ("COLOR_TAPE", 250.0),
    ("TRANSPARENT", 0.0),
    ("PACKING_COST", 220.0),
    ("BOPP_FILM_RATE", 118.0),
    ("ADHESIVE_RATE", 11.0),
    ("COATING_EXP", 12.0),
    ("PROFIT", 12.0),
    ("ADHESIVE_LESS_RATE", 0.0),
];

/// Whether `key` is one of the 16 canonical rate keys (case-sensitive).
pub fn is_canonical(key: &str) -> bool {
    DEFAULT_RATES.iter().any(|(k, _)| *k == key)
}

/// Default value for a canonical key, `None` for unknown keys.
pub fn default_value(key: &str) -> Option<f64> {
    DEFAULT_RATES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Drop non-canonical keys from a fetched mapping, returning the keys
/// that were removed so the caller can log them. The store accepts any
/// key; the presentation layer only understands the canonical set.
pub fn retain_canonical(rates: &mut BTreeMap<String, f64>) -> Vec<String> {
    let unknown: Vec<String> = rates
        .keys()
        .filter(|k| !is_canonical(k.as_str()))
        .cloned()
        .collect();
    for key in &unknown {
        rates.remove(key);
    }
    unknown
}

/// Fill in the default value for every canonical key absent from
/// `rates`, returning the keys that were filled. Presentation-layer
/// helper; the store itself never defaults.
pub fn fill_missing_defaults(rates: &mut BTreeMap<String, f64>) -> Vec<String> {
    let mut filled = Vec::new();
    for (key, default) in DEFAULT_RATES {
        if !rates.contains_key(key) {
            rates.insert(key.to_string(), default);
            filled.push(key.to_string());
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_set_is_exactly_sixteen() {
        assert_eq!(DEFAULT_RATES.len(), 16);
        let categorized = PRINT_TYPE_KEYS.len()
            + PASTE_TYPE_KEYS.len()
            + BASE_RATE_KEYS.len()
            + OTHER_RATE_KEYS.len();
        assert_eq!(categorized, 16, "every canonical key belongs to one category");
        for (key, _) in DEFAULT_RATES {
            assert!(
                PRINT_TYPE_KEYS.contains(&key)
                    || PASTE_TYPE_KEYS.contains(&key)
                    || BASE_RATE_KEYS.contains(&key)
                    || OTHER_RATE_KEYS.contains(&key),
                "{key} is uncategorized"
            );
        }
    }

    #[test]
    fn unknown_keys_are_stripped_and_reported() {
        let mut rates = BTreeMap::new();
        rates.insert("PROFIT".to_string(), 12.0);
        rates.insert("LEGACY_FREIGHT".to_string(), 9.0);

        let unknown = retain_canonical(&mut rates);

        assert_eq!(unknown, vec!["LEGACY_FREIGHT".to_string()]);
        assert_eq!(rates.len(), 1);
        assert!(rates.contains_key("PROFIT"));
    }

    #[test]
    fn missing_keys_get_defaults() {
        let mut rates = BTreeMap::new();
        rates.insert("PROFIT".to_string(), 15.0);

        let filled = fill_missing_defaults(&mut rates);

        assert_eq!(rates.len(), 16);
        assert_eq!(filled.len(), 15);
        // Fetched value is preserved, only absent keys are defaulted
        assert_eq!(rates["PROFIT"], 15.0);
        assert_eq!(rates["BOPP_FILM_RATE"], 118.0);
        assert_eq!(rates["TRANSPARENT"], 0.0);
    }
}

use super::filter::FacetFilters;
use crate::types::{utf16_len, FacetCounts};

/// Longest value, in UTF-16 units, a facet table may contain and still be exposed.
pub const MAX_EXPOSED_VALUE_LEN: usize = 63;

/// Drop facet tables that would be noise in a UI.
///
/// A field's table survives when all of these hold:
/// - `facet` is unset, or names this field;
/// - it has at most `threshold% * max_result_count` distinct values;
/// - none of its values is longer than [`MAX_EXPOSED_VALUE_LEN`] UTF-16 units;
/// - the field is filtered on, `facet` is set, or it has more than one value.
pub fn censor(
    counts: FacetCounts,
    threshold: u32,
    max_result_count: usize,
    facet: Option<&str>,
    filters: &FacetFilters,
) -> FacetCounts {
    let max_cardinality = f64::from(threshold) * max_result_count as f64 / 100.0;
    counts
        .into_iter()
        .filter(|(field, values)| {
            if let Some(target) = facet {
                if field != target {
                    return false;
                }
            }
            if values.len() as f64 > max_cardinality {
                return false;
            }
            if values
                .keys()
                .any(|v| utf16_len(v) > MAX_EXPOSED_VALUE_LEN)
            {
                return false;
            }
            filters.constrains(field) || facet.is_some() || values.len() > 1
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn table(entries: &[(&str, u64)]) -> IndexMap<String, u64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn counts() -> FacetCounts {
        let mut counts = FacetCounts::new();
        counts.insert("category".into(), table(&[("x", 3), ("y", 2)]));
        counts.insert("brand".into(), table(&[("acme", 5)]));
        counts.insert(
            "sku".into(),
            table(&[("s1", 1), ("s2", 1), ("s3", 1), ("s4", 1), ("s5", 1)]),
        );
        counts
    }

    fn no_filters() -> FacetFilters {
        FacetFilters::default()
    }

    #[test]
    fn test_single_value_tables_are_dropped() {
        let kept = censor(counts(), 100, 5, None, &no_filters());
        assert!(kept.contains_key("category"));
        assert!(!kept.contains_key("brand"));
        assert!(kept.contains_key("sku"));
    }

    #[test]
    fn test_high_cardinality_tables_are_dropped() {
        let kept = censor(counts(), 80, 5, None, &no_filters());
        assert!(kept.contains_key("category"));
        assert!(!kept.contains_key("sku"), "5 values > 80% of 5");
    }

    #[test]
    fn test_cardinality_limit_applies_to_requested_facet() {
        let kept = censor(counts(), 80, 5, Some("sku"), &no_filters());
        assert!(kept.is_empty());
    }

    #[test]
    fn test_requested_facet_is_the_only_survivor() {
        let kept = censor(counts(), 100, 5, Some("brand"), &no_filters());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept["brand"]["acme"], 5);
    }

    #[test]
    fn test_filtered_field_keeps_single_value_table() {
        let filters = FacetFilters::from_value(&json!(["brand:acme"]));
        let kept = censor(counts(), 100, 5, None, &filters);
        assert!(kept.contains_key("brand"));
    }

    #[test]
    fn test_long_values_hide_the_whole_table() {
        let long = "t".repeat(64);
        let mut counts = counts();
        counts.insert("title".into(), table(&[("short", 1), (long.as_str(), 1)]));
        let kept = censor(counts, 100, 5, None, &no_filters());
        assert!(!kept.contains_key("title"));
        assert!(kept.contains_key("category"));
    }

    #[test]
    fn test_exposed_length_counts_utf16_units() {
        let wide = "😀".repeat(32);
        let narrow = "😀".repeat(31);
        let mut counts = counts();
        counts.insert("wide".into(), table(&[("a", 1), (wide.as_str(), 1)]));
        counts.insert("narrow".into(), table(&[("a", 1), (narrow.as_str(), 1)]));
        let kept = censor(counts, 100, 5, None, &no_filters());
        assert!(!kept.contains_key("wide"));
        assert!(kept.contains_key("narrow"));
    }

    #[test]
    fn test_field_order_is_preserved() {
        let kept = censor(counts(), 100, 5, None, &no_filters());
        let fields: Vec<&String> = kept.keys().collect();
        assert_eq!(fields, vec!["category", "sku"]);
    }
}

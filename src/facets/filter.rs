use crate::types::{facet_value, scalar_to_string, Hit};

/// A single `field:value` equality test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEquals {
    pub field: String,
    pub value: String,
}

impl FieldEquals {
    /// Split at the first `:`. Values may contain further colons.
    pub fn parse(raw: &str) -> Option<Self> {
        let (field, value) = raw.split_once(':')?;
        Some(FieldEquals {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub fn matches(&self, hit: &Hit) -> bool {
        let value = match hit.field(&self.field) {
            Some(v) => v,
            None => return false,
        };
        if facet_value(&value).as_deref() == Some(self.value.as_str()) {
            return true;
        }
        match value {
            serde_json::Value::Array(items) => items
                .iter()
                .any(|item| scalar_to_string(item).as_deref() == Some(self.value.as_str())),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    Equals(FieldEquals),
    /// Nested array form: matches when any member matches.
    AnyOf(Vec<FieldEquals>),
    /// Not a `field:value` string. Matches nothing.
    Malformed,
}

impl FilterClause {
    fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => FieldEquals::parse(s)
                .map(FilterClause::Equals)
                .unwrap_or(FilterClause::Malformed),
            serde_json::Value::Array(items) => {
                let parsed: Option<Vec<FieldEquals>> = items
                    .iter()
                    .map(|item| item.as_str().and_then(FieldEquals::parse))
                    .collect();
                match parsed {
                    Some(members) if !members.is_empty() => FilterClause::AnyOf(members),
                    _ => FilterClause::Malformed,
                }
            }
            _ => FilterClause::Malformed,
        }
    }

    fn matches(&self, hit: &Hit) -> bool {
        match self {
            FilterClause::Equals(eq) => eq.matches(hit),
            FilterClause::AnyOf(members) => members.iter().any(|eq| eq.matches(hit)),
            FilterClause::Malformed => false,
        }
    }
}

/// Conjunction of facet filter clauses, parsed from the `facetFilters` parameter.
///
/// Accepts a single `"field:value"` string, an array of them, or an array
/// mixing strings and string arrays. Anything unparseable becomes a
/// [`FilterClause::Malformed`] clause, which rejects every hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetFilters {
    clauses: Vec<FilterClause>,
}

impl FacetFilters {
    pub fn from_value(value: &serde_json::Value) -> Self {
        let clauses = match value {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Array(items) => items.iter().map(FilterClause::from_value).collect(),
            other => vec![FilterClause::from_value(other)],
        };
        let filters = FacetFilters { clauses };
        if filters.has_malformed() {
            tracing::debug!(filters = %value, "Malformed facet filter, no hits will match");
        }
        filters
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn has_malformed(&self) -> bool {
        self.clauses
            .iter()
            .any(|c| matches!(c, FilterClause::Malformed))
    }

    pub fn matches(&self, hit: &Hit) -> bool {
        self.clauses.iter().all(|c| c.matches(hit))
    }

    pub fn apply(&self, hits: Vec<Hit>) -> Vec<Hit> {
        if self.is_empty() {
            return hits;
        }
        hits.into_iter().filter(|hit| self.matches(hit)).collect()
    }

    /// Whether any well-formed clause constrains `field`.
    pub fn constrains(&self, field: &str) -> bool {
        self.clauses.iter().any(|c| match c {
            FilterClause::Equals(eq) => eq.field == field,
            FilterClause::AnyOf(members) => members.iter().any(|eq| eq.field == field),
            FilterClause::Malformed => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hits() -> Vec<Hit> {
        [
            json!({"id": "1", "category": "books", "year": 2020, "tags": ["a", "b"]}),
            json!({"id": "2", "category": "books", "year": 2021, "tags": ["b"]}),
            json!({"id": "3", "category": "music", "year": 2020, "note": "x:y"}),
        ]
        .iter()
        .map(|d| Hit::new(d["id"].as_str().unwrap().into(), 1.0, d.as_object().unwrap()))
        .collect()
    }

    fn ids(hits: &[Hit]) -> Vec<&str> {
        hits.iter().map(|h| h.object_id.as_str()).collect()
    }

    #[test]
    fn test_empty_filters_keep_everything() {
        let filters = FacetFilters::from_value(&json!([]));
        assert_eq!(ids(&filters.apply(hits())), vec!["1", "2", "3"]);
        let filters = FacetFilters::from_value(&serde_json::Value::Null);
        assert_eq!(filters.apply(hits()).len(), 3);
    }

    #[test]
    fn test_filters_are_anded() {
        let filters = FacetFilters::from_value(&json!(["category:books", "year:2020"]));
        assert_eq!(ids(&filters.apply(hits())), vec!["1"]);
    }

    #[test]
    fn test_single_string_filter() {
        let filters = FacetFilters::from_value(&json!("category:music"));
        assert_eq!(ids(&filters.apply(hits())), vec!["3"]);
    }

    #[test]
    fn test_value_may_contain_colons() {
        let filters = FacetFilters::from_value(&json!(["note:x:y"]));
        assert_eq!(ids(&filters.apply(hits())), vec!["3"]);
    }

    #[test]
    fn test_nested_array_is_disjunctive() {
        let filters = FacetFilters::from_value(&json!([["category:music", "year:2021"]]));
        assert_eq!(ids(&filters.apply(hits())), vec!["2", "3"]);
    }

    #[test]
    fn test_array_fields_match_member_or_joined_value() {
        let member = FacetFilters::from_value(&json!(["tags:b"]));
        assert_eq!(ids(&member.apply(hits())), vec!["1", "2"]);
        let joined = FacetFilters::from_value(&json!(["tags:a, b"]));
        assert_eq!(ids(&joined.apply(hits())), vec!["1"]);
    }

    #[test]
    fn test_missing_field_rejects() {
        let filters = FacetFilters::from_value(&json!(["note:x:y", "category:books"]));
        assert!(filters.apply(hits()).is_empty());
    }

    #[test]
    fn test_malformed_filters_fail_closed() {
        for raw in [json!([42]), json!([{"category": "books"}]), json!(["nocolon"]), json!(7)] {
            let filters = FacetFilters::from_value(&raw);
            assert!(filters.has_malformed(), "{raw} should be malformed");
            assert!(filters.apply(hits()).is_empty(), "{raw} should reject all hits");
        }
    }

    #[test]
    fn test_filtering_is_commutative_and_idempotent() {
        let ab = FacetFilters::from_value(&json!(["category:books", "tags:b"]));
        let ba = FacetFilters::from_value(&json!(["tags:b", "category:books"]));
        let once = ab.apply(hits());
        assert_eq!(ids(&once), ids(&ba.apply(hits())));
        let twice = ab.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_constrains_reports_filtered_fields() {
        let filters = FacetFilters::from_value(&json!(["category:books", ["year:2020"], 3]));
        assert!(filters.constrains("category"));
        assert!(filters.constrains("year"));
        assert!(!filters.constrains("tags"));
    }
}

use crate::types::{facet_value, utf16_len, FacetCounts, Hit, OBJECT_ID};

/// Longest string value, in UTF-16 units, that is still counted as a facet value.
pub const MAX_COUNTED_VALUE_LEN: usize = 64;

const ALWAYS_SKIPPED: [&str; 2] = [OBJECT_ID, "ref"];

/// Count `(field, value)` occurrences over `hits`.
///
/// The reference field, `objectID` and `ref` are never counted. Arrays are
/// joined with `", "`; only string and number values are counted, and
/// strings longer than [`MAX_COUNTED_VALUE_LEN`] UTF-16 units are skipped.
pub fn count_facets<'a, I>(hits: I, reference_field: &str) -> FacetCounts
where
    I: IntoIterator<Item = &'a Hit>,
{
    let mut counts = FacetCounts::new();
    for hit in hits {
        for (field, raw) in &hit.document {
            if field == reference_field || ALWAYS_SKIPPED.contains(&field.as_str()) {
                continue;
            }
            let value = match facet_value(raw) {
                Some(v) => v,
                None => continue,
            };
            if !raw.is_number() && utf16_len(&value) > MAX_COUNTED_VALUE_LEN {
                continue;
            }
            *counts
                .entry(field.clone())
                .or_default()
                .entry(value)
                .or_insert(0) += 1;
        }
    }
    counts
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A flat corpus record. Key order is preserved from the source payload.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Per-field value counts over a hit set, in first-seen order.
pub type FacetCounts = IndexMap<String, IndexMap<String, u64>>;

/// Name of the normalized identifier field carried by every [`Hit`].
pub const OBJECT_ID: &str = "objectID";

/// Which field identifies a document and which fields are searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(rename = "ref")]
    pub reference_field: String,
    #[serde(rename = "fields", default)]
    pub searchable_fields: Vec<String>,
}

/// Location of an index directory written by
/// [`LexicalIndex::build_in_dir`](crate::index::LexicalIndex::build_in_dir).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecomputedIndex {
    pub directory: PathBuf,
}

/// The payload a [`BundleSource`](crate::index::source::BundleSource) yields.
///
/// Accepts both `documents`/`precomputedIndex` and the shorter
/// `docs`/`computedIndex` spellings. Unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBundle {
    #[serde(alias = "docs")]
    pub documents: Vec<Document>,
    pub mapping: Mapping,
    #[serde(
        default,
        alias = "computedIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub precomputed_index: Option<PrecomputedIndex>,
}

impl IndexBundle {
    pub fn from_slice(bytes: &[u8]) -> crate::error::Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| crate::error::ShortstackError::InvalidBundle(e.to_string()))
    }
}

/// A corpus document enriched with its identifier and match signal.
///
/// Serializes flat: the document's own fields, then `objectID` and `_score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    #[serde(flatten)]
    pub document: Document,
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(rename = "_score")]
    pub score: f32,
}

impl Hit {
    pub fn new(object_id: String, score: f32, document: &Document) -> Self {
        let mut document = document.clone();
        document.remove(OBJECT_ID);
        document.remove("_score");
        Hit {
            document,
            object_id,
            score,
        }
    }

    /// Look up a field the way filters see it, including `objectID`.
    pub fn field(&self, name: &str) -> Option<serde_json::Value> {
        if name == OBJECT_ID {
            return Some(serde_json::Value::String(self.object_id.clone()));
        }
        self.document.get(name).cloned()
    }
}

/// Render a scalar the way a JavaScript template string would.
///
/// Strings pass through, numbers drop a trailing `.0`. Everything else is
/// not a scalar and yields `None`.
pub fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(number_to_string)
            }
        }
        _ => None,
    }
}

/// `Number.prototype.toString` for finite floats: shortest round-trip
/// digits, exponent form outside `[1e-6, 1e21)`, and no negative zero.
fn number_to_string(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return f.to_string();
    }
    let formatted = format!("{:e}", f);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

/// String length as JavaScript reports it, in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Coerce a field value into its facet representation.
///
/// Arrays of scalars are joined with `", "`.
pub fn facet_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Array(items) => {
            let parts: Option<Vec<String>> = items.iter().map(scalar_to_string).collect();
            parts.map(|p| p.join(", "))
        }
        other => scalar_to_string(other),
    }
}

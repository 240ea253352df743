use crate::types::{scalar_to_string, Document, Mapping};
use std::collections::HashMap;

/// The documents backing one index, keyed by their reference value.
///
/// Documents without a scalar reference value are dropped. When two
/// documents share a reference value the first one wins.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    ids: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Corpus {
    pub fn from_documents(documents: Vec<Document>, mapping: &Mapping) -> Self {
        let mut corpus = Corpus {
            documents: Vec::with_capacity(documents.len()),
            ids: Vec::with_capacity(documents.len()),
            positions: HashMap::with_capacity(documents.len()),
        };
        let mut skipped = 0usize;
        let mut duplicates = 0usize;

        for doc in documents {
            let id = match doc.get(&mapping.reference_field).and_then(scalar_to_string) {
                Some(id) => id,
                None => {
                    skipped += 1;
                    continue;
                }
            };
            if corpus.positions.contains_key(&id) {
                duplicates += 1;
                continue;
            }
            corpus.positions.insert(id.clone(), corpus.documents.len());
            corpus.ids.push(id);
            corpus.documents.push(doc);
        }

        if skipped > 0 {
            tracing::warn!(
                skipped,
                reference_field = %mapping.reference_field,
                "Dropped documents without a reference value"
            );
        }
        if duplicates > 0 {
            tracing::warn!(
                duplicates,
                reference_field = %mapping.reference_field,
                "Dropped documents with a duplicate reference value"
            );
        }
        corpus
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.positions.get(id).map(|&i| &self.documents[i])
    }

    /// `(reference value, document)` pairs in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.documents.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: serde_json::Value) -> Vec<Document> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn mapping() -> Mapping {
        Mapping {
            reference_field: "id".into(),
            searchable_fields: vec!["title".into()],
        }
    }

    #[test]
    fn test_numeric_reference_values_are_stringified() {
        let corpus = Corpus::from_documents(docs(json!([{"id": 1, "title": "a"}])), &mapping());
        assert_eq!(corpus.get("1").unwrap()["title"], "a");
    }

    #[test]
    fn test_first_duplicate_wins_and_missing_refs_drop() {
        let corpus = Corpus::from_documents(
            docs(json!([
                {"id": "a", "title": "first"},
                {"id": "a", "title": "second"},
                {"title": "orphan"},
                {"id": "b", "title": "other"}
            ])),
            &mapping(),
        );
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("a").unwrap()["title"], "first");
        let ids: Vec<&str> = corpus.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}

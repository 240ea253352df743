pub mod accessor;
pub mod corpus;
pub mod source;

use crate::error::{Result, ShortstackError};
use crate::types::{scalar_to_string, Document, Mapping};
use corpus::Corpus;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, Query as TantivyQuery, QueryParser};
use tantivy::schema::{Field, Schema as TantivySchema, Value, STORED, STRING, TEXT};
use tantivy::{Index as TantivyIndex, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

pub use accessor::{IndexAccessor, LoadedIndex};

const REFERENCE_FIELD: &str = "ref";

fn searchable_field_name(position: usize) -> String {
    format!("f{}", position)
}

/// One document reference returned by a text search, with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub reference: String,
    pub score: f32,
}

/// Full-text index over one corpus, backed by Tantivy.
///
/// The schema holds one stored raw field for the reference value and one
/// tokenized field per searchable field of the [`Mapping`]. Field names
/// inside Tantivy are positional, so any mapping field name is accepted.
///
/// # Examples
///
/// ```rust
/// use shortstack::index::{corpus::Corpus, LexicalIndex};
/// use shortstack::types::Mapping;
/// use serde_json::json;
///
/// # fn main() -> shortstack::Result<()> {
/// let mapping = Mapping {
///     reference_field: "id".into(),
///     searchable_fields: vec!["title".into()],
/// };
/// let doc = json!({"id": "1", "title": "Blueberry pancakes"});
/// let corpus = Corpus::from_documents(vec![doc.as_object().unwrap().clone()], &mapping);
/// let index = LexicalIndex::build(&mapping, &corpus)?;
/// assert_eq!(index.search("pancakes")?.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct LexicalIndex {
    inner: TantivyIndex,
    reader: IndexReader,
    reference: Field,
    searchable: Vec<Field>,
}

impl LexicalIndex {
    pub const WRITER_BUFFER_SIZE: usize = 20_000_000;

    /// Build an in-RAM index over `corpus`.
    pub fn build(mapping: &Mapping, corpus: &Corpus) -> Result<Self> {
        let (schema, reference, searchable) = Self::schema_for(mapping);
        let inner = TantivyIndex::create_in_ram(schema);
        Self::index_corpus(&inner, mapping, corpus, reference, &searchable)?;
        Self::from_parts(inner, reference, searchable)
    }

    /// Build an index persisted at `path`, so later loads can skip indexing.
    pub fn build_in_dir<P: AsRef<Path>>(
        path: P,
        mapping: &Mapping,
        corpus: &Corpus,
    ) -> Result<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let (schema, reference, searchable) = Self::schema_for(mapping);
        let inner = TantivyIndex::create_in_dir(path, schema)?;
        Self::index_corpus(&inner, mapping, corpus, reference, &searchable)?;
        Self::from_parts(inner, reference, searchable)
    }

    /// Open an index previously written by [`LexicalIndex::build_in_dir`].
    pub fn open_in_dir<P: AsRef<Path>>(path: P, mapping: &Mapping) -> Result<Self> {
        let inner = TantivyIndex::open_in_dir(path)?;
        let schema = inner.schema();
        let reference = schema.get_field(REFERENCE_FIELD)?;
        let searchable = (0..mapping.searchable_fields.len())
            .map(|i| schema.get_field(&searchable_field_name(i)))
            .collect::<tantivy::Result<Vec<Field>>>()?;
        Self::from_parts(inner, reference, searchable)
    }

    fn schema_for(mapping: &Mapping) -> (TantivySchema, Field, Vec<Field>) {
        let mut builder = TantivySchema::builder();
        let reference = builder.add_text_field(REFERENCE_FIELD, STRING | STORED);
        let searchable = (0..mapping.searchable_fields.len())
            .map(|i| builder.add_text_field(&searchable_field_name(i), TEXT))
            .collect();
        (builder.build(), reference, searchable)
    }

    fn index_corpus(
        inner: &TantivyIndex,
        mapping: &Mapping,
        corpus: &Corpus,
        reference: Field,
        searchable: &[Field],
    ) -> Result<()> {
        let mut writer: IndexWriter = inner.writer_with_num_threads(1, Self::WRITER_BUFFER_SIZE)?;
        for (id, doc) in corpus.iter() {
            writer.add_document(Self::to_tantivy(id, doc, mapping, reference, searchable))?;
        }
        writer.commit()?;
        Ok(())
    }

    fn to_tantivy(
        id: &str,
        doc: &Document,
        mapping: &Mapping,
        reference: Field,
        searchable: &[Field],
    ) -> TantivyDocument {
        let mut tantivy_doc = TantivyDocument::new();
        tantivy_doc.add_text(reference, id);
        for (name, &field) in mapping.searchable_fields.iter().zip(searchable) {
            match doc.get(name) {
                Some(serde_json::Value::Array(items)) => {
                    for text in items.iter().filter_map(scalar_to_string) {
                        tantivy_doc.add_text(field, text);
                    }
                }
                Some(value) => {
                    if let Some(text) = scalar_to_string(value) {
                        tantivy_doc.add_text(field, text);
                    }
                }
                None => {}
            }
        }
        tantivy_doc
    }

    fn from_parts(inner: TantivyIndex, reference: Field, searchable: Vec<Field>) -> Result<Self> {
        let reader = inner
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(LexicalIndex {
            inner,
            reader,
            reference,
            searchable,
        })
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Every matching reference, best match first.
    ///
    /// A blank query matches the whole corpus. Query syntax errors are
    /// tolerated: the parseable part of the query is used.
    pub fn search(&self, query: &str) -> Result<Vec<Match>> {
        let searcher = self.reader.searcher();
        let limit = searcher.num_docs() as usize;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let parsed: Box<dyn TantivyQuery> = if query.trim().is_empty() {
            Box::new(AllQuery)
        } else {
            let parser = QueryParser::for_index(&self.inner, self.searchable.clone());
            let (parsed, errors) = parser.parse_query_lenient(query);
            if !errors.is_empty() {
                tracing::debug!(query, errors = errors.len(), "Lenient query parse");
            }
            parsed
        };

        let top_docs = searcher.search(parsed.as_ref(), &TopDocs::with_limit(limit))?;
        let mut matches = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let reference = doc
                .get_first(self.reference)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    ShortstackError::Tantivy(format!("Document {:?} has no reference", addr))
                })?;
            matches.push(Match {
                reference: reference.to_string(),
                score,
            });
        }
        Ok(matches)
    }
}

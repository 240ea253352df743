use super::corpus::Corpus;
use super::source::BundleSource;
use super::LexicalIndex;
use crate::error::{Result, ShortstackError};
use crate::types::{IndexBundle, Mapping};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

/// A ready-to-query index with the corpus and mapping it was built from.
pub struct LoadedIndex {
    index: LexicalIndex,
    corpus: Corpus,
    mapping: Mapping,
}

impl LoadedIndex {
    /// Build (or open, when the bundle carries a precomputed index) the text
    /// index for a bundle. CPU-bound.
    pub fn from_bundle(bundle: IndexBundle) -> Result<Self> {
        let mapping = bundle.mapping;
        let corpus = Corpus::from_documents(bundle.documents, &mapping);

        let index = match bundle.precomputed_index {
            Some(precomputed) => {
                match LexicalIndex::open_in_dir(&precomputed.directory, &mapping) {
                    Ok(index) if index.num_docs() == corpus.len() as u64 => index,
                    Ok(index) => {
                        tracing::warn!(
                            directory = %precomputed.directory.display(),
                            indexed = index.num_docs(),
                            corpus = corpus.len(),
                            "Precomputed index is out of date, rebuilding"
                        );
                        LexicalIndex::build(&mapping, &corpus)?
                    }
                    Err(e) => {
                        tracing::warn!(
                            directory = %precomputed.directory.display(),
                            error = %e,
                            "Cannot open precomputed index, rebuilding"
                        );
                        LexicalIndex::build(&mapping, &corpus)?
                    }
                }
            }
            None => LexicalIndex::build(&mapping, &corpus)?,
        };

        Ok(LoadedIndex {
            index,
            corpus,
            mapping,
        })
    }

    pub fn index(&self) -> &LexicalIndex {
        &self.index
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn document_count(&self) -> usize {
        self.corpus.len()
    }
}

/// Lazily loads one index from a primary source, falling back to the
/// secondary sources in order.
///
/// The first successful load is memoized. Concurrent first callers share a
/// single load; a failed load is not memoized and is retried on the next call.
pub struct IndexAccessor {
    primary: Arc<dyn BundleSource>,
    fallbacks: Vec<Arc<dyn BundleSource>>,
    loaded: OnceCell<Arc<LoadedIndex>>,
}

impl IndexAccessor {
    pub fn new(primary: impl BundleSource + 'static) -> Self {
        IndexAccessor {
            primary: Arc::new(primary),
            fallbacks: Vec::new(),
            loaded: OnceCell::new(),
        }
    }

    pub fn with_fallback(mut self, source: impl BundleSource + 'static) -> Self {
        self.fallbacks.push(Arc::new(source));
        self
    }

    pub fn location(&self) -> String {
        self.primary.location()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    pub async fn get(&self) -> Result<Arc<LoadedIndex>> {
        self.loaded.get_or_try_init(|| self.load()).await.cloned()
    }

    async fn load(&self) -> Result<Arc<LoadedIndex>> {
        let start = Instant::now();
        let bundle = self.fetch_bundle().await?;
        let fetched = start.elapsed();

        let loaded = tokio::task::spawn_blocking(move || LoadedIndex::from_bundle(bundle))
            .await
            .map_err(|e| ShortstackError::DataUnavailable(format!("Index build failed: {}", e)))??;

        tracing::info!(
            location = %self.primary.location(),
            documents = loaded.document_count(),
            fetch_ms = fetched.as_millis() as u64,
            total_ms = start.elapsed().as_millis() as u64,
            "Index loaded"
        );
        Ok(Arc::new(loaded))
    }

    async fn fetch_bundle(&self) -> Result<IndexBundle> {
        let mut last_error = None;
        for source in std::iter::once(&self.primary).chain(self.fallbacks.iter()) {
            match source.fetch().await {
                Ok(bundle) => return Ok(bundle),
                Err(e) => {
                    tracing::warn!(
                        location = %source.location(),
                        error = %e,
                        "Index source failed"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(ShortstackError::DataUnavailable(match last_error {
            Some(e) => format!("{} ({})", self.primary.location(), e),
            None => self.primary.location(),
        }))
    }
}

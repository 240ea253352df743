use indexmap::IndexMap;
use shortstack::index::source::ResourceSource;
use shortstack::{
    ClientConfig, IndexAccessor, LocalWorker, SearchClient, SearchWorker, ShortstackError,
    WorkerConfig,
};
use std::sync::Arc;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7700";
pub const DEFAULT_INDEX_LOCATION: &str = "search_index.json";
pub const DEFAULT_CENSOR_THRESHOLD: u32 = 80;

/// One served index: its name and where its bundle comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub location: String,
    pub fallbacks: Vec<String>,
}

impl IndexSpec {
    /// Parse `name=location[|fallback...]`. Without `name=`, the location
    /// doubles as the name.
    pub fn parse(entry: &str) -> Result<Self, ShortstackError> {
        let entry = entry.trim();
        let (name, sources) = match entry.split_once('=') {
            Some((name, sources)) => (name.trim(), sources),
            None => (entry, entry),
        };
        let mut sources = sources.split('|').map(str::trim).filter(|s| !s.is_empty());
        let location = sources
            .next()
            .ok_or_else(|| ShortstackError::Config(format!("index '{}' has no location", name)))?;
        if name.is_empty() {
            return Err(ShortstackError::Config(format!(
                "index entry '{}' has an empty name",
                entry
            )));
        }
        Ok(IndexSpec {
            name: name.to_string(),
            location: location.to_string(),
            fallbacks: sources.map(String::from).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub indexes: Vec<IndexSpec>,
    pub worker: WorkerConfig,
    pub client: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            indexes: vec![IndexSpec {
                name: DEFAULT_INDEX_LOCATION.to_string(),
                location: DEFAULT_INDEX_LOCATION.to_string(),
                fallbacks: Vec::new(),
            }],
            worker: WorkerConfig::with_censor_threshold(DEFAULT_CENSOR_THRESHOLD),
            client: ClientConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ShortstackError> {
        let defaults = ServerConfig::default();
        let indexes = match std::env::var("SHORTSTACK_INDEXES") {
            Ok(raw) if !raw.trim().is_empty() => parse_indexes(&raw)?,
            _ => defaults.indexes,
        };
        let censor_threshold = std::env::var("SHORTSTACK_CENSOR_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CENSOR_THRESHOLD);
        Ok(ServerConfig {
            bind_addr: std::env::var("SHORTSTACK_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            indexes,
            worker: WorkerConfig::with_censor_threshold(censor_threshold),
            client: ClientConfig::from_env(),
        })
    }

    /// One cached [`LocalWorker`] per index, registered in config order.
    pub fn build_client(&self) -> Result<SearchClient, ShortstackError> {
        let mut workers: IndexMap<String, Arc<dyn SearchWorker>> = IndexMap::new();
        for spec in &self.indexes {
            let accessor = spec.fallbacks.iter().fold(
                IndexAccessor::new(ResourceSource::new(spec.location.clone())),
                |accessor, fallback| accessor.with_fallback(ResourceSource::new(fallback.clone())),
            );
            let worker = LocalWorker::new(accessor, self.worker.clone()).cached();
            if workers.insert(spec.name.clone(), Arc::new(worker)).is_some() {
                return Err(ShortstackError::Config(format!(
                    "index '{}' is configured twice",
                    spec.name
                )));
            }
        }
        SearchClient::new(workers, self.client.clone())
    }
}

/// Parse a comma-separated list of [`IndexSpec`] entries.
pub fn parse_indexes(raw: &str) -> Result<Vec<IndexSpec>, ShortstackError> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(IndexSpec::parse)
        .collect()
}

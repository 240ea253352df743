use crate::error::Result;
use crate::types::IndexBundle;
use async_trait::async_trait;
use std::path::PathBuf;

/// Somewhere an [`IndexBundle`] can be loaded from.
#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn location(&self) -> String;

    async fn fetch(&self) -> Result<IndexBundle>;
}

/// A bundle at a URL (`http://`, `https://`) or on disk (`file://` or a bare path).
pub struct ResourceSource {
    location: String,
    client: reqwest::Client,
}

impl ResourceSource {
    pub fn new(location: impl Into<String>) -> Self {
        ResourceSource {
            location: location.into(),
            client: reqwest::Client::new(),
        }
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    fn local_path(&self) -> PathBuf {
        PathBuf::from(
            self.location
                .strip_prefix("file://")
                .unwrap_or(&self.location),
        )
    }
}

#[async_trait]
impl BundleSource for ResourceSource {
    fn location(&self) -> String {
        self.location.clone()
    }

    async fn fetch(&self) -> Result<IndexBundle> {
        let bytes = if self.is_remote() {
            self.client
                .get(&self.location)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?
                .to_vec()
        } else {
            tokio::fs::read(self.local_path()).await?
        };
        IndexBundle::from_slice(&bytes)
    }
}

/// A bundle already in memory, typically the offline fallback payload.
pub struct StaticSource {
    label: String,
    bundle: IndexBundle,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, bundle: IndexBundle) -> Self {
        StaticSource {
            label: label.into(),
            bundle,
        }
    }

    pub fn from_json(label: impl Into<String>, json: &str) -> Result<Self> {
        Ok(Self::new(label, IndexBundle::from_slice(json.as_bytes())?))
    }
}

#[async_trait]
impl BundleSource for StaticSource {
    fn location(&self) -> String {
        self.label.clone()
    }

    async fn fetch(&self) -> Result<IndexBundle> {
        Ok(self.bundle.clone())
    }
}

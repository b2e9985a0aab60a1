pub mod metadata;

pub use metadata::{MetadataDescriptor, describe};

use async_trait::async_trait;
use common::Result;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Which sources currently have data in the processed lake.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Source names, sorted.
    async fn list(&self) -> Result<Vec<String>>;

    async fn exists(&self, source_name: &str) -> Result<bool> {
        Ok(self.list().await?.iter().any(|name| name == source_name))
    }
}

/// Catalog backed by the immediate subdirectories of the processed root.
pub struct FsSourceCatalog {
    root: PathBuf,
}

impl FsSourceCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SourceCatalog for FsSourceCatalog {
    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Processed root does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

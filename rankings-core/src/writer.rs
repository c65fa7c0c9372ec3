//! A thin filesystem capability shared by every component that persists
//! something: write bytes, write JSON, read JSON, append a line. This is
//! the only place polymorphism shows up in the pipeline — everything else
//! is concrete.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::error;

use crate::error::{IngestError, Result};

/// Reads/writes JSON and raw bytes rooted at a directory, creating that
/// directory (and its parents) on first use.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens a store rooted at `root`, creating the directory if absent.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub async fn write_bytes(&self, filename: &str, data: &[u8]) -> Result<()> {
        tokio::fs::write(self.file_path(filename), data).await?;
        Ok(())
    }

    pub async fn read_bytes(&self, filename: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.file_path(filename)).await?)
    }

    pub async fn write_json<T: Serialize + Sync>(&self, filename: &str, value: &T, indent: bool) -> Result<()> {
        let data = if indent {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        self.write_bytes(filename, &data).await
    }

    pub async fn read_json<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let data = self.read_bytes(filename).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Reads `filename` as JSON, falling back to `T::default()` if the
    /// file does not exist (and logging any other I/O/parse failure
    /// before falling back). Mirrors the link store's "absent file is
    /// treated as empty" contract.
    pub async fn read_json_or_default<T: DeserializeOwned + Default>(&self, filename: &str) -> T {
        match self.read_json(filename).await {
            Ok(v) => v,
            Err(IngestError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(e) => {
                error!(filename, error = %e, "failed to read JSON, falling back to default");
                T::default()
            }
        }
    }
}

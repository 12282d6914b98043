//! Key-value storage for issued tokens.
//!
//! Keys are plain file names. `FileCache` keeps one file per key inside a
//! cache directory and replaces it atomically on every write.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt cache entry {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Returns `None` when the entry is missing or holds only whitespace.
    async fn read(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Replaces the entry; previous content is never kept.
    async fn write(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Writes `value` to a fresh owner-only file at `tmp_path`, then renames it over `path`.
async fn replace_file(tmp_path: &Path, path: &Path, value: &str) -> Result<(), CacheError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    // Tokens are credentials: owner read/write only, from creation on
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(tmp_path).await.map_err(io_error(tmp_path))?;
    file.write_all(value.as_bytes())
        .await
        .map_err(io_error(tmp_path))?;
    file.sync_all().await.map_err(io_error(tmp_path))?;
    drop(file);

    tokio::fs::rename(tmp_path, path)
        .await
        .map_err(io_error(path))
}

#[async_trait]
impl TokenCache for FileCache {
    async fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(CacheError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(&self.dir))?;

        let tmp_path = self
            .dir
            .join(format!(".{}.tmp.{}", key, std::process::id()));

        // Leftover from an interrupted run would defeat create_new
        let _ = tokio::fs::remove_file(&tmp_path).await;

        if let Err(e) = replace_file(&tmp_path, &path, value).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        debug!(path = %path.display(), "persisted cache entry");
        Ok(())
    }
}

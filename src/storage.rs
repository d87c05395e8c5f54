use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Object storage for uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn remove(&self, path: &str) -> Result<(), StorageError>;

    /// URL under which a stored object is served.
    fn public_url(&self, path: &str) -> String;

    /// Inverse of `public_url` for objects owned by this store.
    fn path_from_url(&self, url: &str) -> Option<String>;
}

#[derive(Debug)]
pub enum StorageError {
    NotFound,
    InvalidPath(String),
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound => write!(f, "Object not found"),
            StorageError::InvalidPath(p) => write!(f, "Invalid object path: {p}"),
            StorageError::Io(e) => write!(f, "Storage I/O error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound
        } else {
            StorageError::Io(e)
        }
    }
}

/// Relative object paths: `/`-separated segments of `[A-Za-z0-9._-]`,
/// no empty, `.` or `..` segments.
pub fn check_path(path: &str) -> Result<(), StorageError> {
    let valid = !path.is_empty()
        && path.split('/').all(|seg| {
            !seg.is_empty()
                && seg != "."
                && seg != ".."
                && seg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}

/// Stores objects below a directory that is also mounted as static files.
pub struct FsObjectStore {
    root: PathBuf,
    public_base: String,
}

impl FsObjectStore {
    /// `public_base` is the absolute URL prefix the root is served under,
    /// e.g. `https://chapter.example.edu/storage`.
    pub fn new(root: impl Into<PathBuf>, public_base: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        check_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.full_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        let full = self.full_path(path)?;
        tokio::fs::remove_file(&full).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{path}", self.public_base)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.public_base)?.strip_prefix('/')?;
        check_path(rest).ok().map(|()| rest.to_string())
    }
}

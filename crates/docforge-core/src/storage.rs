//! Template and output stores.
//!
//! The pipeline only sees the [`TemplateStore`] and [`OutputStore`] traits.
//! Two buckets implement both:
//!
//! - [`LocalBucket`]: a directory on disk. Templates are read from
//!   `templates/{key}.docx`, outputs are written below the root and linked
//!   under a public base URL, either permanently or with an expiring
//!   signature.
//! - [`MemoryBucket`]: an in-process map, used by tests.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{DocforgeError, Result};

/// Object path of the template stored under `key`.
pub fn template_path(key: &str) -> String {
    format!("templates/{key}.docx")
}

/// Read side: where templates come from.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;

    async fn download(&self, key: &str) -> Result<Vec<u8>>;
}

/// Write side: where generated documents go.
#[async_trait]
pub trait OutputStore: Send + Sync {
    async fn save(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// A URL from which the object at `path` can be retrieved.
    async fn publish(&self, path: &str) -> Result<String>;
}

/// How published links are formed.
#[derive(Clone)]
pub enum LinkPolicy {
    /// `{base}/{path}`, valid forever.
    Public,
    /// `{base}/{path}?expires=..&signature=..`, valid until `expires`.
    Signed { key: Vec<u8>, expiry: Duration },
}

impl std::fmt::Debug for LinkPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => f.write_str("Public"),
            Self::Signed { expiry, .. } => f
                .debug_struct("Signed")
                .field("expiry", expiry)
                .finish_non_exhaustive(),
        }
    }
}

impl LinkPolicy {
    /// Signed links with `key`, or a random per-process key when `None`.
    pub fn signed(key: Option<&str>, expiry: Duration) -> Self {
        let key = match key {
            Some(k) => k.as_bytes().to_vec(),
            None => {
                tracing::warn!("no signing key configured; signed links will not survive a restart");
                uuid::Uuid::new_v4().as_bytes().to_vec()
            }
        };
        Self::Signed { key, expiry }
    }
}

/// Keyed, nested SHA-256 over `path` and `expires`.
fn signature(key: &[u8], path: &str, expires: i64) -> [u8; 32] {
    let inner = Sha256::new()
        .chain_update(key)
        .chain_update(path.as_bytes())
        .chain_update(b"\n")
        .chain_update(expires.to_string().as_bytes())
        .finalize();
    Sha256::new().chain_update(key).chain_update(inner).finalize().into()
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reject absolute paths and any `..` component.
fn relative(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let clean = candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if path.is_empty() || !clean {
        return Err(DocforgeError::Storage(format!("invalid object path {path:?}")));
    }
    Ok(candidate.to_path_buf())
}

/// A bucket rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalBucket {
    root: PathBuf,
    base_url: String,
    links: LinkPolicy,
}

impl LocalBucket {
    pub fn new(root: impl Into<PathBuf>, base_url: &str, links: LinkPolicy) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            links,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of an object path inside the bucket.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        Ok(self.root.join(relative(path)?))
    }

    /// Check a signed link's query against `now` (Unix seconds).
    ///
    /// Public buckets accept every link.
    pub fn verify_link(&self, path: &str, expires: Option<i64>, sig: Option<&str>, now: i64) -> bool {
        match &self.links {
            LinkPolicy::Public => true,
            LinkPolicy::Signed { key, .. } => match (expires, sig) {
                (Some(expires), Some(sig)) => {
                    let Ok(given) = hex::decode(sig) else {
                        return false;
                    };
                    expires >= now && constant_time_eq(&signature(key, path, expires), &given)
                }
                _ => false,
            },
        }
    }

    /// Read an object.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| DocforgeError::Storage(format!("read {}: {e}", full.display())))
    }
}

#[async_trait]
impl TemplateStore for LocalBucket {
    async fn exists(&self, key: &str) -> Result<bool> {
        let full = self.resolve(&template_path(key))?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| DocforgeError::Storage(format!("stat {}: {e}", full.display())))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        self.read(&template_path(key)).await
    }
}

#[async_trait]
impl OutputStore for LocalBucket {
    async fn save(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DocforgeError::Storage(format!("mkdir {}: {e}", parent.display())))?;
        }
        let size = bytes.len();
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| DocforgeError::Storage(format!("write {}: {e}", full.display())))?;
        tracing::debug!(path, size, content_type, "object saved");
        Ok(())
    }

    async fn publish(&self, path: &str) -> Result<String> {
        relative(path)?;
        let url = format!("{}/{path}", self.base_url);
        Ok(match &self.links {
            LinkPolicy::Public => url,
            LinkPolicy::Signed { key, expiry } => {
                let expires = i64::try_from(expiry.as_secs())
                    .ok()
                    .and_then(|ttl| chrono::Utc::now().timestamp().checked_add(ttl))
                    .ok_or_else(|| {
                        DocforgeError::Storage(format!("link expiry {expiry:?} out of range"))
                    })?;
                format!(
                    "{url}?expires={expires}&signature={}",
                    hex::encode(signature(key, path, expires))
                )
            }
        })
    }
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// An in-process bucket.
#[derive(Debug, Default)]
pub struct MemoryBucket {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store template bytes under `key`.
    pub fn insert_template(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.put(
            template_path(key),
            StoredObject {
                bytes,
                content_type: crate::archive::DOCX_CONTENT_TYPE.into(),
            },
        )
    }

    pub fn object(&self, path: &str) -> Result<Option<StoredObject>> {
        Ok(self.lock()?.get(path).cloned())
    }

    /// Paths of every stored object, sorted.
    pub fn paths(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self.lock()?.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }

    fn put(&self, path: String, object: StoredObject) -> Result<()> {
        self.lock()?.insert(path, object);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| DocforgeError::Storage("memory bucket lock poisoned".into()))
    }
}

#[async_trait]
impl TemplateStore for MemoryBucket {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(&template_path(key)))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        self.object(&template_path(key))?
            .map(|o| o.bytes)
            .ok_or_else(|| DocforgeError::Storage(format!("no object {}", template_path(key))))
    }
}

#[async_trait]
impl OutputStore for MemoryBucket {
    async fn save(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        relative(path)?;
        self.put(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        )
    }

    async fn publish(&self, path: &str) -> Result<String> {
        if self.lock()?.contains_key(path) {
            Ok(format!("memory://{path}"))
        } else {
            Err(DocforgeError::Storage(format!("no object {path}")))
        }
    }
}

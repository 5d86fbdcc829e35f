//! Service configuration (`docforge.config.json`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocforgeError, Result};
use crate::variant::VariantDescriptor;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "docforge.config.json";

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Bucket root. Templates live under `templates/`, outputs under `outputs/`.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// Base URL under which `outputs/` is reachable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// When set, output links expire after this many seconds instead of
    /// being public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_url_expiry_secs: Option<u64>,
    /// Key for signing expiring links. Generated per process when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<String>,
    /// Extra variants; a variant with a built-in key replaces the built-in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantDescriptor>,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("bucket")
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            public_base_url: default_public_base_url(),
            bind: default_bind(),
            signed_url_expiry_secs: None,
            signing_key: None,
            variants: Vec::new(),
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| DocforgeError::ConfigNotFound {
                path: path.to_path_buf(),
                source: e,
            })?;
        serde_json::from_str(&contents).map_err(|e| DocforgeError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(DocforgeError::ConfigNotFound { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| DocforgeError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = ServiceConfig {
            storage_root: dir.path().join("bucket"),
            signed_url_expiry_secs: Some(3600),
            variants: vec![VariantDescriptor::with_pilot()],
            ..ServiceConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "bind": "0.0.0.0:9000" }"#).unwrap();
        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded.bind.port(), 9000);
        assert_eq!(loaded.storage_root, PathBuf::from("bucket"));
        assert!(loaded.variants.is_empty());
    }

    #[test]
    fn test_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert!(matches!(
            ServiceConfig::load(&path),
            Err(DocforgeError::ConfigNotFound { .. })
        ));
        assert_eq!(ServiceConfig::load_or_default(&path).unwrap(), ServiceConfig::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ServiceConfig::load_or_default(&path),
            Err(DocforgeError::ConfigParse { .. })
        ));
    }
}

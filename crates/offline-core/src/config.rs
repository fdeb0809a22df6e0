//! Worker Configuration
//!
//! Partition names, manifests and page suffixes for one deployed version.
//! Bump the partition names whenever a manifest changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

/// Default registration scope when a config file does not name one
pub const DEFAULT_SCOPE: &str = "http://localhost/";

/// The three partition names of a deployed version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionNames {
    /// Pre-cached application shell
    pub shell: String,
    /// Third-party scripts and styles
    pub dynamic_asset: String,
    /// Same-origin pages mirrored for offline replay
    pub dynamic_document: String,
}

impl PartitionNames {
    /// Same names behind a namespace prefix
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            shell: format!("{prefix}{}", self.shell),
            dynamic_asset: format!("{prefix}{}", self.dynamic_asset),
            dynamic_document: format!("{prefix}{}", self.dynamic_document),
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.shell, &self.dynamic_asset, &self.dynamic_document]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

impl Default for PartitionNames {
    fn default() -> Self {
        Self {
            shell: "app-shell-v2".into(),
            dynamic_asset: "dynamic-cache-v1".into(),
            dynamic_document: "dynamic-shell-v1".into(),
        }
    }
}

/// Offline worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Registration scope relative URLs resolve against
    pub scope: String,
    pub partitions: PartitionNames,
    /// Assets that must be cached at install
    pub shell_manifest: Vec<String>,
    /// Third-party assets cached on first successful fetch
    pub dynamic_asset_manifest: Vec<String>,
    /// Path suffixes of pages mirrored for offline replay
    pub document_suffixes: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.into(),
            partitions: PartitionNames::default(),
            shell_manifest: vec![
                "./".into(),
                "./index.html".into(),
                "./about.html".into(),
                "./style.css".into(),
                "./register.js".into(),
                "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;800&display=swap".into(),
                "https://cdn.tailwindcss.com".into(),
            ],
            dynamic_asset_manifest: vec![
                "https://cdn.jsdelivr.net/npm/fullcalendar@6.1.11/index.global.min.js".into(),
                "https://cdn.jsdelivr.net/npm/fullcalendar@6.1.11/main.min.css".into(),
                "https://cdnjs.cloudflare.com/ajax/libs/jquery/3.7.1/jquery.min.js".into(),
                "https://cdnjs.cloudflare.com/ajax/libs/select2/4.0.13/js/select2.min.js".into(),
                "https://cdnjs.cloudflare.com/ajax/libs/select2/4.0.13/css/select2.min.css".into(),
            ],
            document_suffixes: vec!["/calendar.html".into(), "/form.html".into()],
        }
    }
}

impl CacheConfig {
    /// Default manifests under a different scope
    pub fn for_scope(scope: &str) -> Result<Self, ConfigError> {
        let config = Self {
            scope: scope.to_string(),
            ..Default::default()
        };
        config.scope_url()?;
        Ok(config)
    }

    pub fn with_partitions(mut self, partitions: PartitionNames) -> Self {
        self.partitions = partitions;
        self
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.scope_url()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The scope as an absolute URL
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope).map_err(|e| ConfigError::InvalidScope {
            scope: self.scope.clone(),
            reason: e.to_string(),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scope {scope:?}: {reason}")]
    InvalidScope { scope: String, reason: String },
}

//! Diagnostics
//!
//! Outcomes the lifecycle manager and dispatcher report while they work.
//! They hold a `DiagnosticSink`; the default sink forwards to `tracing`.

use std::sync::Mutex;

/// Something worth reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Whole shell manifest stored in one batch
    ShellPrecached { count: usize },
    /// Batch install failed; falling back to one asset at a time
    BatchInstallFailed { reason: String },
    /// Shell asset stored by the one-at-a-time fallback
    ShellAssetCached { url: String },
    /// Shell asset could not be cached at install
    ShellAssetSkipped { url: String, reason: String },
    /// Undeclared partition removed at activation
    PartitionDeleted { name: String },
    /// Shell miss served from network and stored
    ShellFetched { url: String },
    /// Shell asset neither cached nor reachable
    ShellUnavailable { url: String, reason: String },
    /// Live page mirrored for offline replay
    DocumentStored { url: String },
    /// Network failed for a page; trying the stored copy
    DocumentNetworkFailed { url: String, reason: String },
    /// Third-party asset fetched and stored
    AssetStored { url: String },
    /// Third-party asset neither cached nor reachable
    AssetUnavailable { url: String, reason: String },
    /// A cache read or write failed; the request still completed
    CacheFailed { partition: String, url: String, reason: String },
}

impl Diagnostic {
    /// Whether this reports a degraded outcome
    pub fn is_warning(&self) -> bool {
        !matches!(
            self,
            Diagnostic::ShellPrecached { .. }
                | Diagnostic::ShellAssetCached { .. }
                | Diagnostic::PartitionDeleted { .. }
                | Diagnostic::ShellFetched { .. }
                | Diagnostic::DocumentStored { .. }
                | Diagnostic::AssetStored { .. }
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::ShellPrecached { count } => write!(f, "App shell precached ({count} assets)"),
            Diagnostic::BatchInstallFailed { reason } => {
                write!(f, "Batch precache failed, adding one by one: {reason}")
            }
            Diagnostic::ShellAssetCached { url } => write!(f, "Cached {url}"),
            Diagnostic::ShellAssetSkipped { url, reason } => write!(f, "Could not cache {url}: {reason}"),
            Diagnostic::PartitionDeleted { name } => write!(f, "Deleting old cache: {name}"),
            Diagnostic::ShellFetched { url } => write!(f, "App shell fetched from network and stored: {url}"),
            Diagnostic::ShellUnavailable { url, reason } => {
                write!(f, "App shell not in cache nor on network: {url}: {reason}")
            }
            Diagnostic::DocumentStored { url } => write!(f, "Stored local copy of dynamic page: {url}"),
            Diagnostic::DocumentNetworkFailed { url, reason } => {
                write!(f, "Network unavailable, trying local copy of dynamic page: {url}: {reason}")
            }
            Diagnostic::AssetStored { url } => write!(f, "Stored dynamic resource: {url}"),
            Diagnostic::AssetUnavailable { url, reason } => {
                write!(f, "Dynamic resource unavailable and not cached: {url}: {reason}")
            }
            Diagnostic::CacheFailed { partition, url, reason } => {
                write!(f, "Cache {partition} failed for {url}: {reason}")
            }
        }
    }
}

/// Receiver of diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            tracing::warn!("[SW] {}", diagnostic);
        } else {
            tracing::info!("[SW] {}", diagnostic);
        }
    }
}

/// Collects diagnostics in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.events().into_iter().filter(Diagnostic::is_warning).collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, diagnostic: Diagnostic) {
        match self.events.lock() {
            Ok(mut events) => events.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.record(Diagnostic::ShellPrecached { count: 7 });
        sink.record(Diagnostic::ShellAssetSkipped {
            url: "https://cdn.tailwindcss.com/".into(),
            reason: "offline".into(),
        });

        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::PartitionDeleted { name: "old-v1".into() };
        assert_eq!(d.to_string(), "Deleting old cache: old-v1");
        assert!(!d.is_warning());

        let d = Diagnostic::AssetStored { url: "https://cdn.tailwindcss.com/".into() };
        assert_eq!(d.to_string(), "Stored dynamic resource: https://cdn.tailwindcss.com/");
        assert!(!d.is_warning());
    }
}

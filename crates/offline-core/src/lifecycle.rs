//! Cache Lifecycle
//!
//! Install pre-caches the application shell; activate drops every partition
//! the current version does not declare and opens the declared ones, so the
//! live partitions are exactly this version's three.

use std::sync::Arc;

use crate::config::{CacheConfig, PartitionNames};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::net::{Fetcher, Request, RequestMode, Response};
use crate::normalize::UrlNormalizer;
use crate::storage::{CacheError, CacheStorage};

/// Outcome of install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Shell URLs now in the shell partition
    pub cached: Vec<String>,
    /// Shell URLs that could not be cached, with the reason
    pub skipped: Vec<(String, String)>,
    /// True if the whole manifest went in as one batch
    pub batched: bool,
    /// Replace the active worker without waiting for its clients to close
    pub skip_waiting: bool,
}

/// Outcome of activate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    /// Take over open clients without waiting for a navigation
    pub claim_clients: bool,
}

/// Owns the three partitions across install and activate
pub struct CacheLifecycle {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DiagnosticSink>,
    partitions: PartitionNames,
    shell_manifest: Vec<String>,
}

impl CacheLifecycle {
    pub fn new(
        normalizer: &UrlNormalizer,
        config: &CacheConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            sink,
            partitions: config.partitions.clone(),
            shell_manifest: config
                .shell_manifest
                .iter()
                .map(|url| normalizer.normalize(url))
                .collect(),
        }
    }

    pub fn partitions(&self) -> &PartitionNames {
        &self.partitions
    }

    /// Pre-cache the shell manifest
    ///
    /// Asset failures never fail the install; only storage errors do.
    pub async fn install(&self) -> Result<InstallReport, CacheError> {
        let shell = self.partitions.shell.as_str();
        self.storage.open(shell).await?;

        let mut report = InstallReport {
            skip_waiting: true,
            ..Default::default()
        };

        match self.add_all(shell, &self.shell_manifest).await {
            Ok(()) => {
                self.sink.record(Diagnostic::ShellPrecached {
                    count: self.shell_manifest.len(),
                });
                report.cached = self.shell_manifest.clone();
                report.batched = true;
            }
            Err(err) => {
                self.sink.record(Diagnostic::BatchInstallFailed {
                    reason: err.to_string(),
                });
                for url in &self.shell_manifest {
                    match self.add(shell, url).await {
                        Ok(()) => {
                            self.sink.record(Diagnostic::ShellAssetCached { url: url.clone() });
                            report.cached.push(url.clone());
                        }
                        Err(err) => {
                            self.sink.record(Diagnostic::ShellAssetSkipped {
                                url: url.clone(),
                                reason: err.to_string(),
                            });
                            report.skipped.push((url.clone(), err.to_string()));
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// Delete every partition not declared by this version, then open the
    /// declared ones that do not exist yet
    pub async fn activate(&self) -> Result<ActivateReport, CacheError> {
        let mut report = ActivateReport {
            claim_clients: true,
            ..Default::default()
        };

        for name in self.storage.keys().await? {
            if self.partitions.contains(&name) {
                continue;
            }
            self.sink.record(Diagnostic::PartitionDeleted { name: name.clone() });
            if self.storage.delete(&name).await? {
                report.deleted.push(name);
            }
        }

        for name in self.partitions.all() {
            self.storage.open(name).await?;
        }

        Ok(report)
    }

    /// Fetch every URL, then store them together; any failure stores nothing
    async fn add_all(&self, partition: &str, urls: &[String]) -> Result<(), CacheError> {
        let mut entries = Vec::with_capacity(urls.len());
        for url in urls {
            let request = precache_request(url);
            let response = self.fetch_ok(&request).await?;
            entries.push((request, response));
        }
        self.storage.put_all(partition, entries).await
    }

    async fn add(&self, partition: &str, url: &str) -> Result<(), CacheError> {
        let request = precache_request(url);
        let response = self.fetch_ok(&request).await?;
        self.storage.put(partition, &request, response).await
    }

    async fn fetch_ok(&self, request: &Request) -> Result<Response, CacheError> {
        let response = self.fetcher.fetch(request).await?;
        if !response.ok() {
            return Err(CacheError::BadStatus {
                url: request.url.clone(),
                status: response.status,
            });
        }
        Ok(response)
    }
}

fn precache_request(url: &str) -> Request {
    Request::get(url).with_mode(RequestMode::Cors)
}

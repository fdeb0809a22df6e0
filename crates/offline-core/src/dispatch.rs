//! Strategy Dispatcher
//!
//! Fetch interception: classify the request, then run exactly one caching
//! strategy for it.
//!
//! | class            | strategy                                      |
//! |------------------|-----------------------------------------------|
//! | shell            | cache first, store on miss, 503 offline       |
//! | dynamic-document | network first, stored copy, offline page      |
//! | dynamic-asset    | cache first ignoring Vary, typed fallback     |
//! | unhandled        | pass through                                  |

use std::sync::Arc;

use crate::classify::{AssetClass, AssetClassifier};
use crate::config::PartitionNames;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::net::{Destination, Fetcher, NetError, Request, RequestMode, Response};
use crate::offline;
use crate::storage::{CacheStorage, MatchOptions};

/// What to do with an intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Answer the page with this response
    Respond(Response),
    /// Let the request take the normal network path
    Passthrough,
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::Passthrough => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            FetchOutcome::Respond(response) => Some(response),
            FetchOutcome::Passthrough => None,
        }
    }
}

/// Routes intercepted requests to their caching strategy
pub struct StrategyDispatcher {
    classifier: AssetClassifier,
    partitions: PartitionNames,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DiagnosticSink>,
}

impl StrategyDispatcher {
    pub fn new(
        classifier: AssetClassifier,
        partitions: PartitionNames,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            classifier,
            partitions,
            storage,
            fetcher,
            sink,
        }
    }

    pub fn classifier(&self) -> &AssetClassifier {
        &self.classifier
    }

    /// Handle one intercepted request; never fails
    pub async fn handle(&self, request: &Request) -> FetchOutcome {
        let class = self.classifier.classify(&request.url);
        tracing::debug!("{} {} -> {}", request.method.as_str(), request.url, class);

        // Storage identity uses the canonical URL
        let request = Request {
            url: self.classifier.normalizer().normalize(&request.url),
            ..request.clone()
        };
        let response = match class {
            AssetClass::Shell => self.shell(&request).await,
            AssetClass::DynamicDocument => self.dynamic_document(&request).await,
            AssetClass::DynamicAsset => self.dynamic_asset(&request).await,
            AssetClass::Unhandled => return FetchOutcome::Passthrough,
        };
        FetchOutcome::Respond(response)
    }

    async fn shell(&self, request: &Request) -> Response {
        let partition = self.partitions.shell.as_str();
        if let Some(cached) = self.lookup(partition, request, MatchOptions::default()).await {
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if self.store(partition, request, &response).await {
                    self.sink.record(Diagnostic::ShellFetched {
                        url: request.url.clone(),
                    });
                }
                response
            }
            Err(err) => {
                self.sink.record(Diagnostic::ShellUnavailable {
                    url: request.url.clone(),
                    reason: err.to_string(),
                });
                offline::offline_generic()
            }
        }
    }

    async fn dynamic_document(&self, request: &Request) -> Response {
        let partition = self.partitions.dynamic_document.as_str();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if self.store(partition, request, &response).await {
                    self.sink.record(Diagnostic::DocumentStored {
                        url: request.url.clone(),
                    });
                }
                response
            }
            Err(err) => {
                self.sink.record(Diagnostic::DocumentNetworkFailed {
                    url: request.url.clone(),
                    reason: err.to_string(),
                });
                self.lookup(partition, request, MatchOptions::default())
                    .await
                    .unwrap_or_else(offline::offline_document)
            }
        }
    }

    async fn dynamic_asset(&self, request: &Request) -> Response {
        let partition = self.partitions.dynamic_asset.as_str();
        if let Some(cached) = self.lookup(partition, request, MatchOptions::ignoring_vary()).await {
            return cached;
        }

        let cors = request.clone().with_mode(RequestMode::Cors);
        match self.fetcher.fetch(&cors).await {
            Ok(response) => {
                if (response.ok() || response.is_opaque()) && self.store(partition, request, &response).await {
                    self.sink.record(Diagnostic::AssetStored {
                        url: request.url.clone(),
                    });
                }
                response
            }
            Err(err) => self.asset_fallback(request, err),
        }
    }

    fn asset_fallback(&self, request: &Request, err: NetError) -> Response {
        self.sink.record(Diagnostic::AssetUnavailable {
            url: request.url.clone(),
            reason: err.to_string(),
        });
        match request.destination {
            Destination::Style => offline::offline_style(),
            Destination::Script => offline::offline_script(),
            _ => offline::offline_generic(),
        }
    }

    /// Storage read; a failing read counts as a miss
    async fn lookup(&self, partition: &str, request: &Request, options: MatchOptions) -> Option<Response> {
        match self.storage.match_request(partition, request, options).await {
            Ok(found) => found,
            Err(err) => {
                self.cache_failed(partition, request, err.to_string());
                None
            }
        }
    }

    /// Store a copy; a failing write is reported and otherwise ignored
    async fn store(&self, partition: &str, request: &Request, response: &Response) -> bool {
        match self.storage.put(partition, request, response.clone()).await {
            Ok(()) => true,
            Err(err) => {
                self.cache_failed(partition, request, err.to_string());
                false
            }
        }
    }

    fn cache_failed(&self, partition: &str, request: &Request, reason: String) {
        self.sink.record(Diagnostic::CacheFailed {
            partition: partition.to_string(),
            url: request.url.clone(),
            reason,
        });
    }
}

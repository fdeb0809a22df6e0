//! Offline Worker
//!
//! Host-side lifecycle of one deployed worker version. Requests are only
//! intercepted once activation has completed.

use std::sync::Arc;

use crate::classify::AssetClassifier;
use crate::config::{CacheConfig, ConfigError};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::dispatch::{FetchOutcome, StrategyDispatcher};
use crate::lifecycle::{ActivateReport, CacheLifecycle, InstallReport};
use crate::net::{Fetcher, Request};
use crate::normalize::UrlNormalizer;
use crate::storage::{CacheError, CacheStorage};

/// Service worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    /// Check if this state allows fetch interception
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Parsed => write!(f, "parsed"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Activated => write!(f, "activated"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}

/// Worker errors
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker is {actual}, expected {expected}")]
    InvalidState {
        expected: WorkerState,
        actual: WorkerState,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builder for `OfflineWorker`
pub struct OfflineWorkerBuilder {
    config: CacheConfig,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DiagnosticSink>,
}

impl OfflineWorkerBuilder {
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Result<OfflineWorker, WorkerError> {
        let normalizer = UrlNormalizer::new(self.config.scope_url()?);
        let lifecycle = CacheLifecycle::new(
            &normalizer,
            &self.config,
            self.storage.clone(),
            self.fetcher.clone(),
            self.sink.clone(),
        );
        let classifier = AssetClassifier::from_config(normalizer, &self.config);
        let dispatcher = StrategyDispatcher::new(
            classifier,
            self.config.partitions.clone(),
            self.storage,
            self.fetcher,
            self.sink,
        );

        Ok(OfflineWorker {
            state: WorkerState::Parsed,
            lifecycle,
            dispatcher,
            skip_waiting: false,
            controls_clients: false,
        })
    }
}

/// One worker version driven through install, activate and fetch
pub struct OfflineWorker {
    state: WorkerState,
    lifecycle: CacheLifecycle,
    dispatcher: StrategyDispatcher,
    skip_waiting: bool,
    controls_clients: bool,
}

impl OfflineWorker {
    /// Start building a worker over the given storage and network
    pub fn builder(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> OfflineWorkerBuilder {
        OfflineWorkerBuilder {
            config: CacheConfig::default(),
            storage,
            fetcher,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Install asked to replace the active worker immediately
    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting
    }

    /// Activation claimed the open clients
    pub fn controls_clients(&self) -> bool {
        self.controls_clients
    }

    pub fn dispatcher(&self) -> &StrategyDispatcher {
        &self.dispatcher
    }

    /// Run the install step; a storage failure makes the worker redundant
    pub async fn install(&mut self) -> Result<InstallReport, WorkerError> {
        self.expect_state(WorkerState::Parsed)?;
        self.state = WorkerState::Installing;

        match self.lifecycle.install().await {
            Ok(report) => {
                self.skip_waiting = report.skip_waiting;
                self.state = WorkerState::Installed;
                tracing::info!(
                    "Worker installed: {} cached, {} skipped",
                    report.cached.len(),
                    report.skipped.len()
                );
                Ok(report)
            }
            Err(err) => {
                self.state = WorkerState::Redundant;
                Err(err.into())
            }
        }
    }

    pub async fn activate(&mut self) -> Result<ActivateReport, WorkerError> {
        self.expect_state(WorkerState::Installed)?;
        self.state = WorkerState::Activating;

        match self.lifecycle.activate().await {
            Ok(report) => {
                self.controls_clients = report.claim_clients;
                self.state = WorkerState::Activated;
                tracing::info!("Worker activated: {} old caches deleted", report.deleted.len());
                Ok(report)
            }
            Err(err) => {
                self.state = WorkerState::Redundant;
                Err(err.into())
            }
        }
    }

    /// Intercept a request; before activation everything passes through
    pub async fn fetch(&self, request: &Request) -> FetchOutcome {
        if !self.state.can_intercept_fetch() {
            tracing::debug!("Worker {} not intercepting {}", self.state, request.url);
            return FetchOutcome::Passthrough;
        }
        self.dispatcher.handle(request).await
    }

    fn expect_state(&self, expected: WorkerState) -> Result<(), WorkerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WorkerError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}

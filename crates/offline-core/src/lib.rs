//! Offline Worker Core
//!
//! Request classification and cache strategies for an offline-first web
//! application.
//!
//! Every intercepted request is classified as shell, dynamic document,
//! dynamic asset or unhandled, and answered by that category's strategy.
//!
//! # Example
//! ```rust,ignore
//! use offline_core::{OfflineWorker, MemoryCacheStorage, Request};
//!
//! let mut worker = OfflineWorker::builder(Arc::new(MemoryCacheStorage::new()), fetcher).build()?;
//! worker.install().await?;
//! worker.activate().await?;
//! let outcome = worker.fetch(&Request::navigate("http://localhost/form.html")).await;
//! ```

pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod lifecycle;
pub mod net;
pub mod normalize;
pub mod offline;
pub mod storage;
pub mod worker;

pub use classify::{AssetClass, AssetClassifier, ClassifierRule, UrlMatcher};
pub use config::{CacheConfig, ConfigError, PartitionNames};
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use dispatch::{FetchOutcome, StrategyDispatcher};
pub use lifecycle::{ActivateReport, CacheLifecycle, InstallReport};
pub use net::{Destination, Fetcher, Method, NetError, Request, RequestMode, Response, ResponseType};
pub use normalize::UrlNormalizer;
pub use storage::{CacheError, CacheStorage, MatchOptions, MemoryCacheStorage};
pub use worker::{OfflineWorker, OfflineWorkerBuilder, WorkerError, WorkerState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

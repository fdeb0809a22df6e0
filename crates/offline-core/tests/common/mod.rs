//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use offline_core::*;
use url::Url;

pub const SCOPE: &str = "https://app.example/pwa/";
pub const JQUERY: &str = "https://cdnjs.cloudflare.com/ajax/libs/jquery/3.7.1/jquery.min.js";
pub const SELECT2_CSS: &str = "https://cdnjs.cloudflare.com/ajax/libs/select2/4.0.13/css/select2.min.css";
pub const TAILWIND: &str = "https://cdn.tailwindcss.com";

pub fn scoped(path: &str) -> String {
    format!("{SCOPE}{path}")
}

/// Scripted network
///
/// Unrouted URLs answer 200 with the URL as body.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<Request>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(url: &str) -> String {
        match Url::parse(url) {
            Ok(url) => url.into(),
            Err(_) => url.to_string(),
        }
    }

    pub fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(Self::key(url), response);
    }

    /// This URL never answers
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(Self::key(url));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        let key = Self::key(url);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| Self::key(&r.url) == key)
            .count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        self.calls.lock().unwrap().push(request.clone());
        let key = Self::key(&request.url);

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&key) {
            return Err(NetError::Network(format!("cannot reach {key}")));
        }

        let routed = self.routes.lock().unwrap().get(&key).cloned();
        Ok(routed.unwrap_or_else(|| Response::new(200, key.into_bytes())))
    }
}

/// Storage whose every operation fails
pub struct BrokenStorage;

fn quota_exceeded<T>() -> Result<T, CacheError> {
    Err(CacheError::Storage("quota exceeded".into()))
}

#[async_trait]
impl CacheStorage for BrokenStorage {
    async fn open(&self, _name: &str) -> Result<(), CacheError> {
        quota_exceeded()
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        quota_exceeded()
    }

    async fn delete(&self, _name: &str) -> Result<bool, CacheError> {
        quota_exceeded()
    }

    async fn match_request(
        &self,
        _name: &str,
        _request: &Request,
        _options: MatchOptions,
    ) -> Result<Option<Response>, CacheError> {
        quota_exceeded()
    }

    async fn put(&self, _name: &str, _request: &Request, _response: Response) -> Result<(), CacheError> {
        quota_exceeded()
    }

    async fn put_all(&self, _name: &str, _entries: Vec<(Request, Response)>) -> Result<(), CacheError> {
        quota_exceeded()
    }

    async fn requests(&self, _name: &str) -> Result<Vec<Request>, CacheError> {
        quota_exceeded()
    }
}

pub fn config() -> CacheConfig {
    CacheConfig::for_scope(SCOPE).unwrap()
}

pub fn normalizer() -> UrlNormalizer {
    UrlNormalizer::new(Url::parse(SCOPE).unwrap())
}

pub struct Harness {
    pub config: CacheConfig,
    pub storage: Arc<MemoryCacheStorage>,
    pub fetcher: Arc<MockFetcher>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            storage: Arc::new(MemoryCacheStorage::new()),
            fetcher: Arc::new(MockFetcher::new()),
            sink: Arc::new(RecordingSink::new()),
        }
    }

    pub fn dispatcher(&self) -> StrategyDispatcher {
        StrategyDispatcher::new(
            AssetClassifier::from_config(normalizer(), &self.config),
            self.config.partitions.clone(),
            self.storage.clone(),
            self.fetcher.clone(),
            self.sink.clone(),
        )
    }

    pub fn lifecycle(&self) -> CacheLifecycle {
        CacheLifecycle::new(
            &normalizer(),
            &self.config,
            self.storage.clone(),
            self.fetcher.clone(),
            self.sink.clone(),
        )
    }

    pub fn worker(&self) -> OfflineWorker {
        OfflineWorker::builder(self.storage.clone(), self.fetcher.clone())
            .config(self.config.clone())
            .sink(self.sink.clone())
            .build()
            .unwrap()
    }

    /// Stored URLs of one partition
    pub async fn stored(&self, partition: &str) -> Vec<String> {
        self.storage
            .requests(partition)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect()
    }
}

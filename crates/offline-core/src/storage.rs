//! Cache Storage
//!
//! Named cache partitions of request/response pairs. The worker only talks
//! to the `CacheStorage` trait; `MemoryCacheStorage` is the in-process
//! implementation used by the proxy binary and the tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::net::{Method, NetError, Request, Response, find_header};

/// Options for `CacheStorage::match_request`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Match on method and URL alone, even if the stored response varies
    pub ignore_vary: bool,
}

impl MatchOptions {
    pub fn ignoring_vary() -> Self {
        Self { ignore_vary: true }
    }
}

/// Cache storage error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cannot store a {method} request")]
    UnsupportedMethod { method: &'static str },

    #[error("{url} answered with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error(transparent)]
    Network(#[from] NetError),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Named partitions of cached responses
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a partition, creating it if missing
    async fn open(&self, name: &str) -> Result<(), CacheError>;

    /// Names of all live partitions
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Delete a partition; `false` if it did not exist
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;

    /// Look up a stored response in one partition
    async fn match_request(
        &self,
        name: &str,
        request: &Request,
        options: MatchOptions,
    ) -> Result<Option<Response>, CacheError>;

    /// Store a response, replacing any entry with the same identity
    async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), CacheError>;

    /// Store several responses as one unit: all or nothing
    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), CacheError>;

    /// Requests stored in a partition
    async fn requests(&self, name: &str) -> Result<Vec<Request>, CacheError>;
}

/// Cache entry
#[derive(Debug, Clone)]
struct CacheEntry {
    request: Request,
    response: Response,
}

/// One named partition
#[derive(Debug, Clone, Default)]
struct Partition {
    entries: Vec<CacheEntry>,
}

impl Partition {
    fn put(&mut self, request: Request, response: Response) {
        let key = request.cache_key();
        self.entries.retain(|e| e.request.cache_key() != key);
        self.entries.push(CacheEntry { request, response });
    }

    fn match_request(&self, request: &Request, options: MatchOptions) -> Option<&Response> {
        let key = request.cache_key();
        self.entries
            .iter()
            .find(|e| e.request.cache_key() == key && (options.ignore_vary || vary_matches(e, request)))
            .map(|e| &e.response)
    }
}

/// Check the stored response's `Vary` fields against the incoming request
fn vary_matches(entry: &CacheEntry, incoming: &Request) -> bool {
    let Some(vary) = find_header(&entry.response.headers, "Vary") else {
        return true;
    };

    vary.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .all(|field| field != "*" && entry.request.header(field) == incoming.header(field))
}

fn check_storable(request: &Request) -> Result<(), CacheError> {
    if request.method == Method::Get {
        Ok(())
    } else {
        Err(CacheError::UnsupportedMethod {
            method: request.method.as_str(),
        })
    }
}

/// In-process cache storage
///
/// Partitions are kept in creation order. The lock is held only for the
/// synchronous map operation, never across an await.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    partitions: Mutex<Vec<(String, Partition)>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_partitions<T>(
        &self,
        f: impl FnOnce(&mut Vec<(String, Partition)>) -> T,
    ) -> Result<T, CacheError> {
        let mut partitions = self
            .partitions
            .lock()
            .map_err(|_| CacheError::Storage("partition lock poisoned".into()))?;
        Ok(f(&mut partitions))
    }
}

fn open_partition<'p>(partitions: &'p mut Vec<(String, Partition)>, name: &str) -> &'p mut Partition {
    let index = match partitions.iter().position(|(n, _)| n == name) {
        Some(index) => index,
        None => {
            partitions.push((name.to_string(), Partition::default()));
            partitions.len() - 1
        }
    };
    &mut partitions[index].1
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        self.with_partitions(|partitions| {
            open_partition(partitions, name);
        })
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.with_partitions(|partitions| partitions.iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        self.with_partitions(|partitions| {
            let before = partitions.len();
            partitions.retain(|(n, _)| n != name);
            partitions.len() < before
        })
    }

    async fn match_request(
        &self,
        name: &str,
        request: &Request,
        options: MatchOptions,
    ) -> Result<Option<Response>, CacheError> {
        self.with_partitions(|partitions| {
            partitions
                .iter()
                .find(|(n, _)| n == name)
                .and_then(|(_, p)| p.match_request(request, options).cloned())
        })
    }

    async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), CacheError> {
        check_storable(request)?;
        self.with_partitions(|partitions| {
            open_partition(partitions, name).put(request.clone(), response);
        })
    }

    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), CacheError> {
        for (request, _) in &entries {
            check_storable(request)?;
        }
        self.with_partitions(|partitions| {
            let partition = open_partition(partitions, name);
            for (request, response) in entries {
                partition.put(request, response);
            }
        })
    }

    async fn requests(&self, name: &str) -> Result<Vec<Request>, CacheError> {
        self.with_partitions(|partitions| {
            partitions
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, p)| p.entries.iter().map(|e| e.request.clone()).collect())
                .unwrap_or_default()
        })
    }
}

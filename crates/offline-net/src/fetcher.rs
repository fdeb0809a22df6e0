//! HTTP Fetcher
//!
//! Blocking reqwest client run on smol's blocking pool. Cross-origin
//! responses are typed the way a browser would expose them: CORS mode keeps
//! them readable, no-cors mode marks them opaque. An opaque response keeps
//! its status and body so the cache can still replay it.

use std::time::Duration;

use async_trait::async_trait;
use offline_core::{Fetcher, Method, NetError, Request, RequestMode, Response, ResponseType};
use url::{Origin, Url};

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// User agent string
    pub user_agent: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max redirects to follow (0 = disable)
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("fOS-OfflineWorker/{}", offline_core::VERSION),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            max_redirects: 10,
        }
    }
}

/// Builder for `HttpFetcher`
pub struct HttpFetcherBuilder {
    config: FetcherConfig,
    scope: Url,
}

impl HttpFetcherBuilder {
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.config.user_agent = ua.to_string();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    pub fn build(self) -> Result<HttpFetcher, NetError> {
        let redirects = if self.config.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(self.config.max_redirects)
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(self.config.user_agent.clone())
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .redirect(redirects)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(HttpFetcher {
            client,
            origin: self.scope.origin(),
            config: self.config,
        })
    }
}

/// Network fetcher for a worker scope
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    origin: Origin,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Start building a fetcher whose same-origin checks use `scope`
    pub fn builder(scope: &str) -> Result<HttpFetcherBuilder, NetError> {
        let scope = Url::parse(scope).map_err(|e| NetError::InvalidUrl(format!("{scope}: {e}")))?;
        Ok(HttpFetcherBuilder {
            config: FetcherConfig::default(),
            scope,
        })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError> {
        tracing::info!("HTTP {} {}", request.method.as_str(), request.url);

        let kind = response_kind(&self.origin, &request.url, request.mode)?;
        let client = self.client.clone();
        let owned = request.clone();
        let response = smol::unblock(move || send(&client, &owned)).await?;

        Ok(response.with_kind(kind))
    }
}

/// How a response to `url` fetched in `mode` is exposed to the page
pub fn response_kind(origin: &Origin, url: &str, mode: RequestMode) -> Result<ResponseType, NetError> {
    let target = Url::parse(url).map_err(|e| NetError::InvalidUrl(format!("{url}: {e}")))?;
    if target.origin() == *origin {
        return Ok(ResponseType::Basic);
    }
    Ok(match mode {
        RequestMode::NoCors => ResponseType::Opaque,
        RequestMode::Cors | RequestMode::Navigate | RequestMode::SameOrigin => ResponseType::Cors,
    })
}

fn send(client: &reqwest::blocking::Client, request: &Request) -> Result<Response, NetError> {
    let mut builder = client.request(reqwest_method(request.method), request.url.as_str());
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let reply = builder.send().map_err(net_error)?;
    let status = reply.status();
    let headers = reply
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();
    let body = reply.bytes().map_err(net_error)?.to_vec();

    Ok(Response {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body,
        kind: ResponseType::Basic,
    })
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
    }
}

fn net_error(err: reqwest::Error) -> NetError {
    if err.is_builder() {
        NetError::InvalidUrl(err.to_string())
    } else {
        NetError::Network(err.to_string())
    }
}

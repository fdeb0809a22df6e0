//! Requests, Responses and the Fetch Seam
//!
//! Value types shared by the storage, the strategies and the network
//! fetcher, plus the `Fetcher` trait the worker fetches through.

use async_trait::async_trait;

/// HTTP method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

/// Request mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// What the requesting page will do with the response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Destination {
    #[default]
    Empty,
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
}

/// An intercepted request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::Get,
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Top-level navigation to a page
    pub fn navigate(url: &str) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_destination(Destination::Document)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Storage identity: method plus URL without fragment
    pub fn cache_key(&self) -> String {
        let url = match self.url.split_once('#') {
            Some((before, _)) => before,
            None => self.url.as_str(),
        };
        format!("{} {}", self.method.as_str(), url)
    }
}

/// How much of a response the page may inspect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Same-origin response
    #[default]
    Basic,
    /// Cross-origin response fetched in CORS mode
    Cors,
    /// Cross-origin response without CORS; status and body hidden
    Opaque,
    /// Built locally by the worker
    Synthetic,
}

/// HTTP Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub kind: ResponseType,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text: default_status_text(status).to_string(),
            headers: Vec::new(),
            body,
            kind: ResponseType::Basic,
        }
    }

    /// Opaque response: status 0, nothing inspectable
    pub fn opaque() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            kind: ResponseType::Opaque,
        }
    }

    pub fn with_status_text(mut self, text: &str) -> Self {
        self.status_text = text.to_string();
        self
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseType::Opaque
    }

    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Get body as text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn default_status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Network error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// The network fetch primitive
///
/// `Ok` carries any HTTP response the server produced, including error
/// statuses. `Err` means no response arrived at all.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = Request::get("https://example.com/app.js")
            .with_mode(RequestMode::Cors)
            .with_destination(Destination::Script)
            .with_header("Accept", "*/*");

        assert_eq!(req.method, Method::Get);
        assert_eq!(req.mode, RequestMode::Cors);
        assert_eq!(req.header("accept"), Some("*/*"));
    }

    #[test]
    fn test_cache_key_drops_fragment() {
        let a = Request::get("https://example.com/page.html#top");
        let b = Request::get("https://example.com/page.html");
        assert_eq!(a.cache_key(), b.cache_key());

        let post = Request::get("https://example.com/page.html").with_method(Method::Post);
        assert_ne!(post.cache_key(), b.cache_key());
    }

    #[test]
    fn test_response_ok_range() {
        assert!(Response::new(200, vec![]).ok());
        assert!(Response::new(204, vec![]).ok());
        assert!(!Response::new(304, vec![]).ok());
        assert!(!Response::new(404, vec![]).ok());
        assert!(!Response::opaque().ok());
        assert!(Response::opaque().is_opaque());
    }

    #[test]
    fn test_response_header_lookup() {
        let resp = Response::new(200, b"body".to_vec())
            .with_header("Content-Type", "text/css");
        assert_eq!(resp.content_type(), Some("text/css"));
        assert_eq!(resp.header("content-type"), Some("text/css"));
        assert_eq!(resp.text(), "body");
    }
}

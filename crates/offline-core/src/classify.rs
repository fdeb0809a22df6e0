//! Asset Classification
//!
//! Tags each request URL with the caching policy that applies to it. Rules
//! are evaluated in order and the first match wins.

use crate::config::CacheConfig;
use crate::normalize::UrlNormalizer;

/// Caching category of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    /// Pre-cached application shell
    Shell,
    /// Same-origin page fetched live and mirrored for offline replay
    DynamicDocument,
    /// Third-party script or style cached on first fetch
    DynamicAsset,
    /// Not intercepted
    Unhandled,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Shell => write!(f, "shell"),
            AssetClass::DynamicDocument => write!(f, "dynamic-document"),
            AssetClass::DynamicAsset => write!(f, "dynamic-asset"),
            AssetClass::Unhandled => write!(f, "unhandled"),
        }
    }
}

/// URL predicate of a classifier rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlMatcher {
    /// Normalized URL equals one of these (already normalized) entries
    Manifest(Vec<String>),
    /// URL path ends with one of these suffixes
    PathSuffix(Vec<String>),
}

/// One (predicate, category) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRule {
    pub matcher: UrlMatcher,
    pub class: AssetClass,
}

/// Ordered rule list over a normalizer
#[derive(Debug, Clone)]
pub struct AssetClassifier {
    normalizer: UrlNormalizer,
    rules: Vec<ClassifierRule>,
}

impl AssetClassifier {
    /// Classifier with no rules; everything is `Unhandled`
    pub fn new(normalizer: UrlNormalizer) -> Self {
        Self {
            normalizer,
            rules: Vec::new(),
        }
    }

    /// Shell, then document suffixes, then dynamic assets
    pub fn from_config(normalizer: UrlNormalizer, config: &CacheConfig) -> Self {
        Self::new(normalizer)
            .with_manifest(AssetClass::Shell, &config.shell_manifest)
            .with_path_suffixes(AssetClass::DynamicDocument, &config.document_suffixes)
            .with_manifest(AssetClass::DynamicAsset, &config.dynamic_asset_manifest)
    }

    /// Append a manifest rule; entries are normalized once here
    pub fn with_manifest(mut self, class: AssetClass, entries: &[String]) -> Self {
        let entries = entries.iter().map(|e| self.normalizer.normalize(e)).collect();
        self.rules.push(ClassifierRule {
            matcher: UrlMatcher::Manifest(entries),
            class,
        });
        self
    }

    pub fn with_path_suffixes(mut self, class: AssetClass, suffixes: &[String]) -> Self {
        self.rules.push(ClassifierRule {
            matcher: UrlMatcher::PathSuffix(suffixes.to_vec()),
            class,
        });
        self
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }

    /// Category of `url`; pure, touches neither network nor cache
    pub fn classify(&self, url: &str) -> AssetClass {
        let normalized = self.normalizer.normalize(url);
        self.rules
            .iter()
            .find(|rule| self.matches(&rule.matcher, &normalized))
            .map(|rule| rule.class)
            .unwrap_or(AssetClass::Unhandled)
    }

    fn matches(&self, matcher: &UrlMatcher, normalized: &str) -> bool {
        match matcher {
            UrlMatcher::Manifest(entries) => entries.iter().any(|e| e == normalized),
            UrlMatcher::PathSuffix(suffixes) => match self.normalizer.path(normalized) {
                Some(path) => suffixes.iter().any(|s| path.ends_with(s.as_str())),
                None => false,
            },
        }
    }
}

//! URL Normalization
//!
//! Canonicalizes request URLs against the worker scope so manifest entries
//! and intercepted requests compare as exact strings.

use url::Url;

/// Resolves URLs against a registration scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlNormalizer {
    scope: Url,
}

impl UrlNormalizer {
    pub fn new(scope: Url) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Canonical absolute form of `raw`
    ///
    /// Absolute URLs are re-serialized, anything else is joined onto the
    /// scope. Input that cannot be resolved either way comes back unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        match Url::parse(raw) {
            Ok(url) => url.into(),
            Err(_) => match self.scope.join(raw) {
                Ok(url) => url.into(),
                Err(err) => {
                    tracing::debug!("Cannot resolve {:?} against scope: {}", raw, err);
                    raw.to_string()
                }
            },
        }
    }

    /// True iff both URLs normalize to the same string
    pub fn same(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    /// Path component of `raw`, if it normalizes to a URL
    pub fn path(&self, raw: &str) -> Option<String> {
        Url::parse(&self.normalize(raw)).ok().map(|url| url.path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> UrlNormalizer {
        UrlNormalizer::new(Url::parse("https://app.example/pwa/").unwrap())
    }

    #[test]
    fn test_relative_resolves_against_scope() {
        let n = normalizer();
        assert_eq!(n.normalize("./"), "https://app.example/pwa/");
        assert_eq!(n.normalize("./index.html"), "https://app.example/pwa/index.html");
        assert_eq!(n.normalize("style.css"), "https://app.example/pwa/style.css");
        assert_eq!(n.normalize("/root.css"), "https://app.example/root.css");
    }

    #[test]
    fn test_absolute_canonicalized() {
        let n = normalizer();
        assert_eq!(n.normalize("HTTPS://CDN.Tailwindcss.com"), "https://cdn.tailwindcss.com/");
        assert_eq!(
            n.normalize("https://app.example/pwa/./a/../index.html"),
            "https://app.example/pwa/index.html"
        );
    }

    #[test]
    fn test_idempotent() {
        let n = normalizer();
        let inputs = [
            "./",
            "./about.html",
            "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;800&display=swap",
            "https://cdn.tailwindcss.com",
            "../outside.html",
            "?q=1",
            "#frag",
            "http://[::1",
            "",
        ];
        for input in inputs {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once, "normalize not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_unresolvable_input_never_panics() {
        let n = normalizer();
        assert_eq!(n.normalize("http://[::1"), "http://[::1");
        assert!(n.path("http://[::1").is_none());
    }

    #[test]
    fn test_same() {
        let n = normalizer();
        assert!(n.same("./index.html", "https://app.example/pwa/index.html"));
        assert!(n.same("https://cdn.tailwindcss.com", "https://cdn.tailwindcss.com/"));
        assert!(!n.same("./index.html", "./about.html"));
    }

    #[test]
    fn test_path() {
        let n = normalizer();
        assert_eq!(n.path("./form.html?x=1").as_deref(), Some("/pwa/form.html"));
    }
}

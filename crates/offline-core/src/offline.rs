//! Synthetic Offline Responses

use crate::net::{Response, ResponseType};

/// Page shown for a dynamic page with no network and no stored copy
pub const OFFLINE_DOCUMENT: &str = r#"<!doctype html>
<html lang="es"><meta charset="utf-8"><title>Offline</title>
<body style="font-family:system-ui;padding:2rem">
<h1>Sin conexión</h1>
<p>No hay una copia local disponible aún de esta página.</p>
<a href="./index.html">Volver al inicio</a>
</body></html>"#;

pub const OFFLINE_STYLE: &str = "/* fallback css */";

/// 503 "Offline"
pub fn offline_generic() -> Response {
    Response::new(503, b"Offline".to_vec())
        .with_status_text("Offline")
        .with_kind(ResponseType::Synthetic)
}

pub fn offline_document() -> Response {
    Response::new(200, OFFLINE_DOCUMENT.as_bytes().to_vec())
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_kind(ResponseType::Synthetic)
}

pub fn offline_style() -> Response {
    Response::new(200, OFFLINE_STYLE.as_bytes().to_vec())
        .with_header("Content-Type", "text/css")
        .with_kind(ResponseType::Synthetic)
}

pub fn offline_script() -> Response {
    Response::new(200, Vec::new())
        .with_header("Content-Type", "application/javascript")
        .with_kind(ResponseType::Synthetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_generic() {
        let resp = offline_generic();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.status_text, "Offline");
    }

    #[test]
    fn test_offline_document() {
        let resp = offline_document();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type(), Some("text/html; charset=utf-8"));
        assert!(resp.text().contains("<h1>Sin conexión</h1>"));
        assert!(resp.text().contains(r#"href="./index.html""#));
    }

    #[test]
    fn test_offline_assets() {
        assert_eq!(offline_style().content_type(), Some("text/css"));
        let script = offline_script();
        assert_eq!(script.content_type(), Some("application/javascript"));
        assert!(script.body.is_empty());
    }
}

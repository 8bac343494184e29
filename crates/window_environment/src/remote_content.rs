//! Remote HTML documents loaded into windows.

use std::sync::OnceLock;

use platform_host::{ContentFetchService, ScriptSource};
use regex::Regex;
use thiserror::Error;

/// Title shown while a remote document is loading.
pub const LOADING_TITLE: &str = "Loading...";

/// Parts of a fetched document a window displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub title: String,
    /// Inner markup of `<body>`, with `<script>` elements removed.
    pub body: String,
    /// Scripts in document order, to run after the body is mounted.
    pub scripts: Vec<ScriptSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteContentError {
    #[error("fetch failed: {0}")]
    Network(String),
    #[error("{url} answered with status {status}")]
    Status { status: u16, url: String },
    #[error("document has no <body>")]
    MissingBody,
}

fn title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid")
    })
}

fn body_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<body[^>]*>(.*)</body>").expect("body pattern is valid")
    })
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<script(\s[^>]*)?>(.*?)</script>").expect("script pattern is valid")
    })
}

fn src_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|\s)src\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
            .expect("src pattern is valid")
    })
}

fn origin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[a-z][a-z0-9+.-]*://[^/?#]+").expect("origin pattern is valid")
    })
}

/// Scheme and authority of `url`, e.g. `https://example.com`. `None` for relative URLs.
pub fn url_origin(url: &str) -> Option<&str> {
    origin_pattern().find(url).map(|m| m.as_str())
}

/// Rewrites root-relative `src` values (`/app.js`) against the origin of `base_url`.
fn resolve_script_src(base_url: &str, src: &str) -> String {
    if src.starts_with('/') && !src.starts_with("//") {
        if let Some(origin) = url_origin(base_url) {
            return format!("{origin}{src}");
        }
    }
    src.to_string()
}

fn script_source(base_url: &str, attributes: &str, inline: &str) -> Option<ScriptSource> {
    if let Some(captures) = src_pattern().captures(attributes) {
        let src = captures
            .get(1)
            .or_else(|| captures.get(2))
            .or_else(|| captures.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        return Some(ScriptSource::External(resolve_script_src(base_url, src)));
    }
    let inline = inline.trim();
    (!inline.is_empty()).then(|| ScriptSource::Inline(inline.to_string()))
}

/// Splits an HTML document into title, body markup and scripts.
///
/// The title falls back to `url` when the document has none.
pub fn parse_remote_document(url: &str, html: &str) -> Result<RemoteDocument, RemoteContentError> {
    let body = body_pattern()
        .captures(html)
        .and_then(|captures| captures.get(1))
        .ok_or(RemoteContentError::MissingBody)?
        .as_str();

    let title = title_pattern()
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| url.to_string());

    let scripts = script_pattern()
        .captures_iter(body)
        .filter_map(|captures| {
            let attributes = captures.get(1).map_or("", |m| m.as_str());
            let inline = captures.get(2).map_or("", |m| m.as_str());
            script_source(url, attributes, inline)
        })
        .collect();
    let body = script_pattern().replace_all(body, "").trim().to_string();

    Ok(RemoteDocument {
        title,
        body,
        scripts,
    })
}

/// Fetches `url` through `fetcher` and parses it.
pub async fn fetch_remote_document(
    fetcher: &dyn ContentFetchService,
    url: &str,
) -> Result<RemoteDocument, RemoteContentError> {
    let document = fetcher
        .fetch_text(url)
        .await
        .map_err(RemoteContentError::Network)?;
    if !document.is_success() {
        return Err(RemoteContentError::Status {
            status: document.status,
            url: document.url,
        });
    }
    parse_remote_document(&document.url, &document.body)
}

//! Remote content host-service contracts.
//!
//! Windows can replace their title and body with a document fetched from a URL. The transport
//! lives behind [`ContentFetchService`] so the runtime can be exercised with canned documents.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`ContentFetchService`].
pub type ContentFetchFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Raw response for a fetched document.
pub struct FetchedDocument {
    /// Final URL of the response (after redirects when the host reports them).
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl FetchedDocument {
    /// Returns whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A script extracted from a fetched document, in document order.
pub enum ScriptSource {
    /// Inline script text.
    Inline(String),
    /// Absolute URL of an external script.
    External(String),
}

/// Host service for fetching remote documents as text.
pub trait ContentFetchService {
    /// Fetches `url` and returns the response whatever its status.
    ///
    /// Transport failures (DNS, CORS, offline) are reported as `Err`.
    fn fetch_text<'a>(
        &'a self,
        url: &'a str,
    ) -> ContentFetchFuture<'a, Result<FetchedDocument, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Fetch service for targets without network access.
pub struct NoopContentFetcher;

impl ContentFetchService for NoopContentFetcher {
    fn fetch_text<'a>(
        &'a self,
        url: &'a str,
    ) -> ContentFetchFuture<'a, Result<FetchedDocument, String>> {
        Box::pin(async move { Err(format!("remote content unavailable for `{url}`")) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory fetch service serving canned responses by exact URL.
pub struct MemoryContentFetcher {
    responses: Rc<RefCell<HashMap<String, Result<FetchedDocument, String>>>>,
}

impl MemoryContentFetcher {
    /// Serves `body` with `status` for `url`.
    pub fn insert_document(&self, url: &str, status: u16, body: &str) {
        self.responses.borrow_mut().insert(
            url.to_string(),
            Ok(FetchedDocument {
                url: url.to_string(),
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Fails transport for `url` with `error`.
    pub fn insert_failure(&self, url: &str, error: &str) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), Err(error.to_string()));
    }
}

impl ContentFetchService for MemoryContentFetcher {
    fn fetch_text<'a>(
        &'a self,
        url: &'a str,
    ) -> ContentFetchFuture<'a, Result<FetchedDocument, String>> {
        Box::pin(async move {
            self.responses
                .borrow()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(format!("no route to `{url}`")))
        })
    }
}

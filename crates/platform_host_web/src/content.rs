//! Remote content adapters: `window.fetch` transport and in-window script execution.

use platform_host::{ContentFetchFuture, ContentFetchService, FetchedDocument, ScriptSource};

use crate::bridge;

#[derive(Debug, Clone, Copy, Default)]
/// Browser content fetcher backed by `window.fetch`.
pub struct WebContentFetcher;

impl ContentFetchService for WebContentFetcher {
    fn fetch_text<'a>(
        &'a self,
        url: &'a str,
    ) -> ContentFetchFuture<'a, Result<FetchedDocument, String>> {
        Box::pin(async move { bridge::fetch_text(url).await })
    }
}

/// Appends `scripts` as `<script>` elements inside the element with id `container_id`, in
/// order. External scripts are inserted with `async = false` so they execute in sequence.
///
/// # Errors
///
/// Returns an error when the container is missing, or off `wasm32` when there is anything to run.
pub fn run_window_scripts(container_id: &str, scripts: &[ScriptSource]) -> Result<(), String> {
    bridge::run_scripts(container_id, scripts)
}

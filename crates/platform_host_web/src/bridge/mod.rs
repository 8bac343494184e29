//! Browser interop for remote content: document fetching and script execution.
//!
//! Calls are routed to the `wasm32` implementation or to a native shim so the adapters above
//! compile and test on every target.

use platform_host::{FetchedDocument, ScriptSource};

#[cfg(not(target_arch = "wasm32"))]
mod non_wasm;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(not(target_arch = "wasm32"))]
use non_wasm as imp;
#[cfg(target_arch = "wasm32")]
use wasm as imp;

pub async fn fetch_text(url: &str) -> Result<FetchedDocument, String> {
    imp::fetch_text(url).await
}

pub fn run_scripts(container_id: &str, scripts: &[ScriptSource]) -> Result<(), String> {
    imp::run_scripts(container_id, scripts)
}

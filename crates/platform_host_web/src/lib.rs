//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! This crate is the concrete browser-side host wiring layer for layout/prefs storage, remote
//! content fetching, in-window script execution, and viewport queries. Every adapter has a
//! native shim so the runtime builds and tests off `wasm32`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
mod bridge;
pub mod content;
pub mod storage;
pub mod viewport;

pub use adapters::{
    content_fetcher, host_strategy_name, prefs_store, selected_host_strategy,
    ContentFetchAdapter, HostStrategy, PrefsStoreAdapter,
};
pub use content::{run_window_scripts, WebContentFetcher};
pub use storage::local_prefs::WebPrefsStore;
pub use viewport::{viewport_size, FALLBACK_VIEWPORT};

use platform_host::{
    ContentFetchFuture, ContentFetchService, FetchedDocument, MemoryPrefsStore,
    NoopContentFetcher, PrefsStore,
};

use crate::{WebContentFetcher, WebPrefsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected host strategy for `platform_host_web` adapters.
pub enum HostStrategy {
    /// Browser-backed adapters (`localStorage`, `fetch`).
    Browser,
    /// Session-only adapters: in-memory layout storage and no network access.
    Ephemeral,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "ephemeral-host")]
    {
        HostStrategy::Ephemeral
    }

    #[cfg(not(feature = "ephemeral-host"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::Ephemeral => "ephemeral",
    }
}

#[derive(Debug, Clone)]
/// Preference store selected for the active host strategy.
pub enum PrefsStoreAdapter {
    /// `localStorage`-backed store.
    Browser(WebPrefsStore),
    /// In-memory store that forgets everything on reload.
    Ephemeral(MemoryPrefsStore),
}

impl PrefsStore for PrefsStoreAdapter {
    fn load_pref(&self, key: &str) -> Result<Option<String>, String> {
        match self {
            Self::Browser(store) => store.load_pref(key),
            Self::Ephemeral(store) => store.load_pref(key),
        }
    }

    fn save_pref(&self, key: &str, raw_json: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.save_pref(key, raw_json),
            Self::Ephemeral(store) => store.save_pref(key, raw_json),
        }
    }

    fn delete_pref(&self, key: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.delete_pref(key),
            Self::Ephemeral(store) => store.delete_pref(key),
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// Content fetcher selected for the active host strategy.
pub enum ContentFetchAdapter {
    /// `window.fetch`-backed fetcher.
    Browser(WebContentFetcher),
    /// Fetcher that reports every URL as unreachable.
    Ephemeral(NoopContentFetcher),
}

impl ContentFetchService for ContentFetchAdapter {
    fn fetch_text<'a>(
        &'a self,
        url: &'a str,
    ) -> ContentFetchFuture<'a, Result<FetchedDocument, String>> {
        match self {
            Self::Browser(fetcher) => fetcher.fetch_text(url),
            Self::Ephemeral(fetcher) => fetcher.fetch_text(url),
        }
    }
}

/// Builds the preference store for the compile-time selected host strategy.
pub fn prefs_store() -> PrefsStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => PrefsStoreAdapter::Browser(WebPrefsStore),
        HostStrategy::Ephemeral => PrefsStoreAdapter::Ephemeral(MemoryPrefsStore::default()),
    }
}

/// Builds the content fetcher for the compile-time selected host strategy.
pub fn content_fetcher() -> ContentFetchAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => ContentFetchAdapter::Browser(WebContentFetcher),
        HostStrategy::Ephemeral => ContentFetchAdapter::Ephemeral(NoopContentFetcher),
    }
}

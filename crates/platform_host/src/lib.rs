//! Typed host-domain contracts shared by the window environment and browser adapters.
//!
//! This crate is the API-first boundary for platform services: preference/layout storage,
//! remote content fetching, and time helpers. Concrete browser adapters live in
//! `platform_host_web`; the in-memory adapters here back native builds and tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod content;
pub mod storage;
pub mod time;

pub use content::{
    ContentFetchFuture, ContentFetchService, FetchedDocument, MemoryContentFetcher,
    NoopContentFetcher, ScriptSource,
};
pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsStore,
};
pub use time::{clock_label_now, unix_time_ms_now, utc_clock_label};

//! Snapshot and configuration persistence over a [`PrefsStore`].

use platform_host::{load_pref_with, save_pref_with, PrefsStore};
use thiserror::Error;

use crate::model::{
    EnvironmentConfig, EnvironmentSnapshot, SessionInfo, CONFIG_KEY, SESSION_KEY,
};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("preference store failed: {0}")]
    Store(String),
}

/// Writes `snapshot` as JSON under `key`.
pub fn save_layout_snapshot(
    store: &dyn PrefsStore,
    key: &str,
    snapshot: &EnvironmentSnapshot,
) -> Result<(), PersistenceError> {
    let raw = serde_json::to_string(snapshot)?;
    store.save_pref(key, &raw).map_err(PersistenceError::Store)
}

/// Reads the snapshot stored under `key`. `Ok(None)` when nothing is stored.
pub fn load_layout_snapshot(
    store: &dyn PrefsStore,
    key: &str,
) -> Result<Option<EnvironmentSnapshot>, PersistenceError> {
    let Some(raw) = store.load_pref(key).map_err(PersistenceError::Store)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

pub fn clear_layout_snapshot(store: &dyn PrefsStore, key: &str) -> Result<(), PersistenceError> {
    store.delete_pref(key).map_err(PersistenceError::Store)
}

impl EnvironmentConfig {
    /// Loads the config pref, falling back to defaults when absent or unreadable.
    pub fn load(store: &dyn PrefsStore) -> Self {
        match load_pref_with::<_, EnvironmentConfig>(store, CONFIG_KEY) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(err) => {
                leptos::logging::warn!("environment config load failed: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn PrefsStore) -> Result<(), PersistenceError> {
        save_pref_with(store, CONFIG_KEY, self).map_err(PersistenceError::Store)
    }
}

impl SessionInfo {
    /// Loads the session pref shown in the taskbar; a guest session when absent or unreadable.
    pub fn load(store: &dyn PrefsStore) -> Self {
        load_pref_with::<_, SessionInfo>(store, SESSION_KEY)
            .unwrap_or_else(|err| {
                leptos::logging::warn!("session load failed: {err}");
                None
            })
            .unwrap_or_default()
    }

    pub fn save(&self, store: &dyn PrefsStore) -> Result<(), PersistenceError> {
        save_pref_with(store, SESSION_KEY, self).map_err(PersistenceError::Store)
    }
}

/// Coalesces snapshot writes.
///
/// Requests made while the pointer is captured only mark the snapshot dirty; the next
/// [`PersistScheduler::should_flush`] at least `interval_ms` after the previous write lets one
/// write through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistScheduler {
    dirty: bool,
    last_flush_ms: Option<u64>,
    interval_ms: u64,
}

impl PersistScheduler {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            dirty: false,
            last_flush_ms: None,
            interval_ms,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a dirty snapshot may be written at `now_ms`.
    pub fn should_flush(&self, now_ms: u64) -> bool {
        self.dirty
            && self
                .last_flush_ms
                .map_or(true, |last| now_ms.saturating_sub(last) >= self.interval_ms)
    }

    pub fn record_flush(&mut self, now_ms: u64) {
        self.dirty = false;
        self.last_flush_ms = Some(now_ms);
    }

    /// Records an out-of-band write that does not count against the interval.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

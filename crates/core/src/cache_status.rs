//! Event-cache status reported by the one source adapter that supports
//! background caching.
//!
//! The backend reports a map with a single active key. When more than one
//! key is present the lexicographically lowest key is treated as active.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adapter::Adapter;

/// Adapter name of the source that supports event caching.
pub const CACHING_ADAPTER_NAME: &str = "Ethereum";
/// Setting that enables caching on that adapter (`"true"` / `"false"`).
pub const CACHING_SETTING: &str = "Caching";

/// Progress state of a caching run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheState {
    Initialized,
    Processing,
    Done,
    #[serde(other)]
    Unknown,
}

impl CacheState {
    /// CSS-style class of the status badge.
    pub fn class(self) -> &'static str {
        match self {
            CacheState::Initialized => "initialized",
            CacheState::Processing => "processing",
            CacheState::Done => "done",
            CacheState::Unknown => "",
        }
    }
}

/// Status of one caching run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub state: CacheState,
    #[serde(default)]
    pub percent: Option<f64>,
}

/// Full status response, keyed by run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheStatus(pub BTreeMap<String, CacheEntry>);

impl CacheStatus {
    /// The active run: the only key, or the lowest key if several exist.
    pub fn active(&self) -> Option<(&str, &CacheEntry)> {
        self.0.iter().next().map(|(k, v)| (k.as_str(), v))
    }

    /// Progress of the active run. Missing or zero percentages yield `None`.
    pub fn percentage(&self) -> Option<f64> {
        self.active()
            .and_then(|(_, entry)| entry.percent)
            .filter(|p| *p != 0.0 && !p.is_nan())
    }

    /// `true` once the active run has reached [`CacheState::Done`].
    pub fn is_done(&self) -> bool {
        self.active()
            .is_some_and(|(_, entry)| entry.state == CacheState::Done)
    }

    /// Badge class of the active run, empty when there is none.
    pub fn state_class(&self) -> &'static str {
        self.active()
            .map(|(_, entry)| entry.state.class())
            .unwrap_or_default()
    }
}

/// Whether `adapter` is the caching source with caching switched on.
pub fn caching_enabled(adapter: &Adapter) -> bool {
    adapter.adapter_name == CACHING_ADAPTER_NAME
        && adapter
            .current_settings
            .get(CACHING_SETTING)
            .is_some_and(|v| v == "true")
}

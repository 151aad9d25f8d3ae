//! Per-tab network activity counters
//!
//! Only a liveness signal, not a traffic meter: responses without a usable
//! `content-length` add nothing to the byte count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::browser::{RequestDetails, TabId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub request_count: u64,
    pub bytes_received: u64,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub first_activity_at: Option<DateTime<Utc>>,
}

/// In-memory counters, keyed by tab id. Lives and dies with the tracker.
#[derive(Debug, Default)]
pub struct NetworkMonitor {
    stats: HashMap<TabId, NetworkStats>,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a completed request. Returns false for requests that do not
    /// belong to a tab.
    pub fn record(&mut self, details: &RequestDetails) -> bool {
        let Ok(tab_id) = TabId::try_from(details.tab_id) else {
            return false;
        };

        let stats = self.stats.entry(tab_id).or_default();
        stats.request_count = stats.request_count.saturating_add(1);
        stats.bytes_received = stats
            .bytes_received
            .saturating_add(content_length(details).unwrap_or(0));
        stats.last_activity_at = Some(details.timestamp);
        if stats.first_activity_at.is_none() {
            stats.first_activity_at = Some(details.timestamp);
        }
        true
    }

    /// Counters carried over from an earlier run
    pub fn from_snapshot(snapshot: BTreeMap<TabId, NetworkStats>) -> Self {
        Self {
            stats: snapshot.into_iter().collect(),
        }
    }

    /// True until some request has been attributed to a tab
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn forget(&mut self, tab_id: TabId) {
        self.stats.remove(&tab_id);
    }

    pub fn reset(&mut self) {
        self.stats.clear();
    }

    pub fn get(&self, tab_id: TabId) -> Option<&NetworkStats> {
        self.stats.get(&tab_id)
    }

    /// Copy of every tab's counters
    pub fn snapshot(&self) -> BTreeMap<TabId, NetworkStats> {
        self.stats.iter().map(|(id, s)| (*id, s.clone())).collect()
    }
}

fn content_length(details: &RequestDetails) -> Option<u64> {
    details
        .response_headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("content-length"))?
        .value
        .as_deref()?
        .trim()
        .parse()
        .ok()
}

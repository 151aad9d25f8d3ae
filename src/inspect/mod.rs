//! Inspector: merges live tabs with persisted ages and network counters,
//! classifies liveness, and runs the sort/filter/group pipeline.

pub mod liveness;
pub mod panel;
pub mod pipeline;

pub use liveness::Liveness;
pub use panel::{CloseOutcome, Panel, PanelSummary, PanelView, UndoOutcome};
pub use pipeline::{
    apply_view, filter_tabs, group_tabs, sort_tabs, GroupBy, SortDirection, SortKey, TabGroup,
    ViewOptions,
};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::browser::{Browser, Tab, TabId, WindowId};
use crate::error::Result;
use crate::store::KvStore;
use crate::tracker::identity::created_at_for;
use crate::tracker::{NetworkStats, TrackerChannel, TrackerRequest};

const UNTITLED: &str = "Untitled";

/// Per-refresh view of one tab. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabMetrics {
    pub id: TabId,
    pub title: String,
    /// Empty when the tab has no URL
    pub url: String,
    pub favicon: Option<String>,
    pub window_id: WindowId,
    pub position: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub network: NetworkStats,
    pub active: bool,
    pub pinned: bool,
    pub audible: bool,
    pub discarded: bool,
}

impl TabMetrics {
    pub fn from_parts(tab: Tab, created_at: Option<DateTime<Utc>>, network: NetworkStats) -> Self {
        Self {
            id: tab.id,
            title: tab
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            url: tab.url.unwrap_or_default(),
            favicon: tab.favicon,
            window_id: tab.window_id,
            position: tab.position,
            created_at,
            last_accessed_at: tab.last_accessed_at,
            network,
            active: tab.active,
            pinned: tab.pinned,
            audible: tab.audible,
            discarded: tab.discarded,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> Liveness {
        Liveness::classify(self.network.last_activity_at, now)
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at.map(|created| now - created)
    }

    /// Host part of the URL, if it has one
    pub fn domain(&self) -> Option<String> {
        host_of(&self.url)
    }
}

pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_string())
}

/// Pull a fresh snapshot: tab list, tracker counters, stored ages
pub fn load_metrics(
    browser: &dyn Browser,
    channel: &dyn TrackerChannel,
    store: &dyn KvStore,
) -> Result<Vec<TabMetrics>> {
    let tabs = browser.query_tabs()?;
    let mut stats = channel.send(TrackerRequest::GetNetworkStats)?.stats;
    let ids: Vec<TabId> = tabs.iter().map(|t| t.id).collect();
    let created = created_at_for(store, &ids)?;

    Ok(tabs
        .into_iter()
        .map(|tab| {
            let network = stats.remove(&tab.id).unwrap_or_default();
            let created_at = created.get(&tab.id).copied();
            TabMetrics::from_parts(tab, created_at, network)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://www.example.com/a?b"), Some("example.com".to_string()));
        assert_eq!(host_of("http://localhost:8080/"), Some("localhost".to_string()));
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of(""), None);
    }
}

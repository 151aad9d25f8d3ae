//! Filter → sort → group over the merged tab list
//!
//! Every stage is order-preserving: the sort is stable in both directions and
//! grouping never reorders members inside a bucket.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use super::{Liveness, TabMetrics};

/// URL schemes of browser-internal and extension pages
const INTERNAL_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "chrome-search://",
    "edge://",
    "brave://",
    "about:",
    "moz-extension://",
    "devtools://",
    "view-source:",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Age,
    #[default]
    LastAccessed,
    NetworkActivity,
    RequestCount,
    BytesTransferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    None,
    Domain,
    Window,
    Status,
}

/// Current UI selections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewOptions {
    pub sort: SortKey,
    pub direction: SortDirection,
    pub group: GroupBy,
    /// Case-insensitive substring over title or URL
    pub search: Option<String>,
    /// Keep only tabs at least this old
    pub min_age: Option<Duration>,
    pub status: Option<Liveness>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabGroup {
    pub key: String,
    pub label: String,
    pub tabs: Vec<TabMetrics>,
}

pub fn is_internal_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    INTERNAL_PREFIXES.iter().any(|p| lower.starts_with(p))
}

pub fn filter_tabs(tabs: Vec<TabMetrics>, options: &ViewOptions, now: DateTime<Utc>) -> Vec<TabMetrics> {
    let needle = options
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    tabs.into_iter()
        .filter(|tab| !tab.url.is_empty() && !is_internal_url(&tab.url))
        .filter(|tab| match options.min_age {
            Some(threshold) => tab.age(now).is_some_and(|age| age >= threshold),
            None => true,
        })
        .filter(|tab| match &needle {
            Some(needle) => {
                tab.title.to_lowercase().contains(needle.as_str())
                    || tab.url.to_lowercase().contains(needle.as_str())
            }
            None => true,
        })
        .filter(|tab| options.status.map_or(true, |status| tab.status(now) == status))
        .collect()
}

fn millis(ts: Option<DateTime<Utc>>) -> i64 {
    ts.map_or(0, |t| t.timestamp_millis())
}

fn compare(a: &TabMetrics, b: &TabMetrics, key: SortKey, now: DateTime<Utc>) -> Ordering {
    match key {
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Age => {
            let age = |t: &TabMetrics| t.age(now).map_or(0, |d| d.num_milliseconds());
            age(a).cmp(&age(b))
        }
        SortKey::LastAccessed => millis(a.last_accessed_at).cmp(&millis(b.last_accessed_at)),
        SortKey::NetworkActivity => {
            millis(a.network.last_activity_at).cmp(&millis(b.network.last_activity_at))
        }
        SortKey::RequestCount => a.network.request_count.cmp(&b.network.request_count),
        SortKey::BytesTransferred => a.network.bytes_received.cmp(&b.network.bytes_received),
    }
}

/// Stable sort; equal keys keep their input order in either direction
pub fn sort_tabs(tabs: &mut [TabMetrics], key: SortKey, direction: SortDirection, now: DateTime<Utc>) {
    tabs.sort_by(|a, b| {
        let ordering = compare(a, b, key, now);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

pub fn group_tabs(tabs: Vec<TabMetrics>, group: GroupBy, now: DateTime<Utc>) -> Vec<TabGroup> {
    if tabs.is_empty() {
        return Vec::new();
    }

    match group {
        GroupBy::None => vec![TabGroup {
            key: "all".to_string(),
            label: "All tabs".to_string(),
            tabs,
        }],
        GroupBy::Status => {
            let mut buckets: HashMap<Liveness, Vec<TabMetrics>> = HashMap::new();
            for tab in tabs {
                buckets.entry(tab.status(now)).or_default().push(tab);
            }
            Liveness::ORDER
                .iter()
                .filter_map(|status| {
                    let tabs = buckets.remove(status)?;
                    Some(TabGroup {
                        key: status.as_str().to_string(),
                        label: status.as_str().to_string(),
                        tabs,
                    })
                })
                .collect()
        }
        GroupBy::Domain => bucket_by_count(tabs, |tab| {
            let domain = tab.domain().unwrap_or_else(|| "(no host)".to_string());
            (domain.clone(), domain)
        }),
        GroupBy::Window => bucket_by_count(tabs, |tab| {
            (tab.window_id.to_string(), format!("Window {}", tab.window_id))
        }),
    }
}

/// Buckets in first-appearance order, then stably reordered by descending
/// member count
fn bucket_by_count<F>(tabs: Vec<TabMetrics>, key_of: F) -> Vec<TabGroup>
where
    F: Fn(&TabMetrics) -> (String, String),
{
    let mut groups: Vec<TabGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tab in tabs {
        let (key, label) = key_of(&tab);
        match index.get(&key) {
            Some(&i) => groups[i].tabs.push(tab),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(TabGroup {
                    key,
                    label,
                    tabs: vec![tab],
                });
            }
        }
    }

    groups.sort_by(|a, b| b.tabs.len().cmp(&a.tabs.len()));
    groups
}

/// Full pipeline for one render
pub fn apply_view(tabs: Vec<TabMetrics>, options: &ViewOptions, now: DateTime<Utc>) -> Vec<TabGroup> {
    let mut visible = filter_tabs(tabs, options, now);
    sort_tabs(&mut visible, options.sort, options.direction, now);
    group_tabs(visible, options.group, now)
}

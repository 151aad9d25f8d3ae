//! Host browser contracts
//!
//! The tracker and the panel only talk to the browser through the [`Browser`]
//! trait and the [`BrowserEvent`] stream. A real extension host would back
//! these with its tab APIs; [`SimulatedBrowser`] backs them with a JSON state
//! file so the whole pipeline can run from the command line.

mod simulated;

pub use simulated::SimulatedBrowser;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Numeric tab id assigned by the host. Not stable across restarts.
pub type TabId = u32;

pub type WindowId = u32;

/// Live tab snapshot as reported by tab enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    /// Unset for blank tabs that have not navigated anywhere yet
    #[serde(default)]
    pub url: Option<String>,
    pub window_id: WindowId,
    /// Index of the tab inside its window
    pub position: usize,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub audible: bool,
    #[serde(default)]
    pub discarded: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl Tab {
    /// URL if the tab has navigated somewhere
    pub fn resolved_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Arguments for opening a new tab
#[derive(Debug, Clone, Default)]
pub struct NewTab {
    pub url: String,
    pub window_id: Option<WindowId>,
    pub position: Option<usize>,
    pub pinned: bool,
}

/// A single HTTP response header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Details of a completed network request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    /// Negative for requests not attributable to a tab
    pub tab_id: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub response_headers: Vec<HttpHeader>,
}

/// Lifecycle and network events delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BrowserEvent {
    /// Extension installed or tracker (re)started. With `browser_restart`
    /// every open tab has been assigned a new id.
    Startup {
        #[serde(default)]
        browser_restart: bool,
    },
    Created {
        tab: Tab,
    },
    /// Only URL changes are tracked
    Updated {
        tab_id: TabId,
        url: String,
    },
    Moved {
        tab_id: TabId,
        window_id: WindowId,
        from_index: usize,
        to_index: usize,
    },
    Attached {
        tab_id: TabId,
        new_window_id: WindowId,
        new_position: usize,
    },
    Removed {
        tab_id: TabId,
    },
    RequestCompleted(RequestDetails),
}

/// Tab enumeration and mutation commands offered by the host
pub trait Browser {
    /// Enumerate all open tabs across all windows
    fn query_tabs(&self) -> Result<Vec<Tab>>;

    fn get_tab(&self, id: TabId) -> Result<Option<Tab>>;

    fn close_tabs(&mut self, ids: &[TabId]) -> Result<()>;

    /// Focus the window and make the tab active in it
    fn activate(&mut self, id: TabId, window_id: WindowId) -> Result<()>;

    fn set_pinned(&mut self, id: TabId, pinned: bool) -> Result<()>;

    fn move_tab(&mut self, id: TabId, window_id: WindowId, position: usize) -> Result<()>;

    fn create_tab(&mut self, new_tab: NewTab) -> Result<Tab>;
}

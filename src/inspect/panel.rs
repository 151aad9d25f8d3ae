//! Inspector panel state and bulk actions
//!
//! The panel is pull-based: each [`Panel::refresh`] re-queries the browser,
//! the tracker and the store, then runs the view pipeline. Host failures
//! surface as [`PanelView::NoData`] and the next refresh retries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::pipeline::{apply_view, filter_tabs, TabGroup, ViewOptions};
use super::{load_metrics, Liveness, TabMetrics};
use crate::browser::{Browser, NewTab, Tab, TabId, WindowId};
use crate::error::{AutopsyError, Result};
use crate::store::{keys, Entries, KvStore};
use crate::tracker::TrackerChannel;

pub const DEFAULT_CONFIRM_THRESHOLD: usize = 3;
pub const DEFAULT_UNDO_WINDOW_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSummary {
    pub total: usize,
    pub visible: usize,
    pub by_status: BTreeMap<Liveness, usize>,
}

impl PanelSummary {
    pub fn count(&self, status: Liveness) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    Loaded {
        groups: Vec<TabGroup>,
        summary: PanelSummary,
    },
    /// The host could not be queried this time round
    NoData { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Nothing was closed; ask the user and call again with confirmation
    NeedsConfirmation { count: usize },
    Closed { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Restored { count: usize },
    Expired,
    Nothing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClosedTab {
    url: String,
    window_id: WindowId,
    position: usize,
    pinned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClosedBatch {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    closed_at: DateTime<Utc>,
    tabs: Vec<ClosedTab>,
}

pub struct Panel {
    options: ViewOptions,
    confirm_threshold: usize,
    undo_window: Duration,
    snapshot: Vec<TabMetrics>,
}

impl Panel {
    pub fn new(options: ViewOptions) -> Self {
        Self {
            options,
            confirm_threshold: DEFAULT_CONFIRM_THRESHOLD,
            undo_window: Duration::seconds(DEFAULT_UNDO_WINDOW_SECS),
            snapshot: Vec::new(),
        }
    }

    pub fn with_confirm_threshold(mut self, threshold: usize) -> Self {
        self.confirm_threshold = threshold;
        self
    }

    pub fn with_undo_window(mut self, window: Duration) -> Self {
        self.undo_window = window;
        self
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ViewOptions {
        &mut self.options
    }

    /// Tabs from the last successful refresh, unfiltered
    pub fn snapshot(&self) -> &[TabMetrics] {
        &self.snapshot
    }

    pub fn refresh(
        &mut self,
        browser: &dyn Browser,
        channel: &dyn TrackerChannel,
        store: &dyn KvStore,
        now: DateTime<Utc>,
    ) -> PanelView {
        let tabs = match load_metrics(browser, channel, store) {
            Ok(tabs) => tabs,
            Err(err) => {
                warn!(error = %err, "Could not load tab data");
                self.snapshot.clear();
                return PanelView::NoData {
                    reason: err.to_string(),
                };
            }
        };

        let mut by_status = BTreeMap::new();
        for tab in &tabs {
            *by_status.entry(tab.status(now)).or_insert(0) += 1;
        }
        let total = tabs.len();
        self.snapshot = tabs.clone();

        let groups = apply_view(tabs, &self.options, now);
        let visible = groups.iter().map(|g| g.tabs.len()).sum();
        PanelView::Loaded {
            groups,
            summary: PanelSummary {
                total,
                visible,
                by_status,
            },
        }
    }

    /// Ids of the tabs the current filter keeps, in snapshot order
    pub fn filtered_ids(&self, now: DateTime<Utc>) -> Vec<TabId> {
        filter_tabs(self.snapshot.clone(), &self.options, now)
            .iter()
            .map(|t| t.id)
            .collect()
    }

    /// Close a set of tabs. Above the confirmation threshold nothing happens
    /// unless `confirmed` is set. The closed batch is kept for undo.
    pub fn close_tabs(
        &mut self,
        browser: &mut dyn Browser,
        store: &mut dyn KvStore,
        ids: &[TabId],
        confirmed: bool,
        now: DateTime<Utc>,
    ) -> Result<CloseOutcome> {
        if ids.len() > self.confirm_threshold && !confirmed {
            return Ok(CloseOutcome::NeedsConfirmation { count: ids.len() });
        }

        let mut closing: Vec<Tab> = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(tab) = browser.get_tab(id)? {
                closing.push(tab);
            }
        }
        let closing_ids: Vec<TabId> = closing.iter().map(|t| t.id).collect();
        if closing_ids.is_empty() {
            return Ok(CloseOutcome::Closed { count: 0 });
        }

        browser.close_tabs(&closing_ids)?;
        self.snapshot.retain(|t| !closing_ids.contains(&t.id));

        let batch = ClosedBatch {
            closed_at: now,
            tabs: closing
                .iter()
                .filter_map(|tab| {
                    Some(ClosedTab {
                        url: tab.resolved_url()?.to_string(),
                        window_id: tab.window_id,
                        position: tab.position,
                        pinned: tab.pinned,
                    })
                })
                .collect(),
        };
        let mut entries = Entries::new();
        entries.insert(keys::UNDO_LAST_CLOSE.to_string(), serde_json::to_value(&batch)?);
        store.set(entries)?;

        info!(count = closing_ids.len(), "Closed tabs");
        Ok(CloseOutcome::Closed {
            count: closing_ids.len(),
        })
    }

    /// Reopen the last closed batch by URL. Position and pinned state are
    /// best-effort.
    pub fn undo_close(
        &mut self,
        browser: &mut dyn Browser,
        store: &mut dyn KvStore,
        now: DateTime<Utc>,
    ) -> Result<UndoOutcome> {
        let undo_key = [keys::UNDO_LAST_CLOSE.to_string()];
        let Some(value) = store.get_one(keys::UNDO_LAST_CLOSE)? else {
            return Ok(UndoOutcome::Nothing);
        };

        let mut batch: ClosedBatch = match serde_json::from_value(value) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(error = %err, "Discarding unreadable undo record");
                store.remove(&undo_key)?;
                return Ok(UndoOutcome::Nothing);
            }
        };
        if now - batch.closed_at > self.undo_window {
            store.remove(&undo_key)?;
            return Ok(UndoOutcome::Expired);
        }

        // Lowest positions first so later inserts land where they were
        batch.tabs.sort_by_key(|t| (t.window_id, t.position));
        for (index, tab) in batch.tabs.iter().enumerate() {
            let created = browser.create_tab(NewTab {
                url: tab.url.clone(),
                window_id: Some(tab.window_id),
                position: Some(tab.position),
                pinned: tab.pinned,
            });
            if let Err(err) = created {
                // Keep what is left so a later undo can finish the job
                let rest = ClosedBatch {
                    closed_at: batch.closed_at,
                    tabs: batch.tabs[index..].to_vec(),
                };
                let mut entries = Entries::new();
                entries.insert(keys::UNDO_LAST_CLOSE.to_string(), serde_json::to_value(&rest)?);
                store.set(entries)?;
                warn!(error = %err, restored = index, left = rest.tabs.len(), "Undo interrupted");
                return Err(err);
            }
        }
        store.remove(&undo_key)?;

        Ok(UndoOutcome::Restored {
            count: batch.tabs.len(),
        })
    }

    pub fn focus(&self, browser: &mut dyn Browser, id: TabId) -> Result<()> {
        let tab = browser.get_tab(id)?.ok_or(AutopsyError::TabNotFound(id))?;
        browser.activate(id, tab.window_id)
    }

    pub fn set_pinned(&self, browser: &mut dyn Browser, id: TabId, pinned: bool) -> Result<()> {
        browser.set_pinned(id, pinned)
    }

    pub fn move_tab(
        &self,
        browser: &mut dyn Browser,
        id: TabId,
        window_id: WindowId,
        position: usize,
    ) -> Result<()> {
        browser.move_tab(id, window_id, position)
    }

    pub fn open(&self, browser: &mut dyn Browser, new_tab: NewTab) -> Result<Tab> {
        browser.create_tab(new_tab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SimulatedBrowser;
    use crate::store::MemoryStore;
    use crate::tracker::{StatsResponse, TrackerRequest};
    use chrono::TimeZone;

    struct NoStats;

    impl TrackerChannel for NoStats {
        fn send(&self, _request: TrackerRequest) -> Result<StatsResponse> {
            Ok(StatsResponse::default())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn browser_with(urls: &[&str]) -> (SimulatedBrowser, Vec<TabId>) {
        let mut browser = SimulatedBrowser::in_memory();
        let ids = urls
            .iter()
            .map(|url| {
                browser
                    .create_tab(NewTab {
                        url: url.to_string(),
                        ..NewTab::default()
                    })
                    .unwrap()
                    .id
            })
            .collect();
        (browser, ids)
    }

    #[test]
    fn test_refresh_reports_no_data_on_host_failure() {
        let (mut browser, _) = browser_with(&["https://a.test/"]);
        browser.set_unavailable(true);
        let store = MemoryStore::new();
        let mut panel = Panel::new(ViewOptions::default());

        let view = panel.refresh(&browser, &NoStats, &store, now());
        assert!(matches!(view, PanelView::NoData { .. }));

        browser.set_unavailable(false);
        let view = panel.refresh(&browser, &NoStats, &store, now());
        match view {
            PanelView::Loaded { summary, .. } => {
                assert_eq!(summary.total, 1);
                assert_eq!(summary.count(Liveness::Inactive), 1);
            }
            other => panic!("expected data, got {:?}", other),
        }
    }

    #[test]
    fn test_large_close_needs_confirmation() {
        let (mut browser, ids) =
            browser_with(&["https://a.test/", "https://b.test/", "https://c.test/", "https://d.test/"]);
        let mut store = MemoryStore::new();
        let mut panel = Panel::new(ViewOptions::default());

        let outcome = panel.close_tabs(&mut browser, &mut store, &ids, false, now()).unwrap();
        assert_eq!(outcome, CloseOutcome::NeedsConfirmation { count: 4 });
        assert_eq!(browser.query_tabs().unwrap().len(), 4);

        let outcome = panel.close_tabs(&mut browser, &mut store, &ids, true, now()).unwrap();
        assert_eq!(outcome, CloseOutcome::Closed { count: 4 });
        assert!(browser.query_tabs().unwrap().is_empty());
    }

    #[test]
    fn test_small_close_skips_confirmation() {
        let (mut browser, ids) = browser_with(&["https://a.test/", "https://b.test/"]);
        let mut store = MemoryStore::new();
        let mut panel = Panel::new(ViewOptions::default());

        let outcome = panel.close_tabs(&mut browser, &mut store, &ids[..1], false, now()).unwrap();
        assert_eq!(outcome, CloseOutcome::Closed { count: 1 });
        assert_eq!(browser.query_tabs().unwrap().len(), 1);
    }

    #[test]
    fn test_undo_restores_closed_tabs() {
        let (mut browser, ids) = browser_with(&["https://a.test/", "https://b.test/", "https://c.test/"]);
        browser.set_pinned(ids[0], true).unwrap();
        let mut store = MemoryStore::new();
        let mut panel = Panel::new(ViewOptions::default());

        panel
            .close_tabs(&mut browser, &mut store, &[ids[0], ids[2]], false, now())
            .unwrap();
        let outcome = panel
            .undo_close(&mut browser, &mut store, now() + Duration::seconds(5))
            .unwrap();
        assert_eq!(outcome, UndoOutcome::Restored { count: 2 });

        let urls: Vec<String> = browser
            .query_tabs()
            .unwrap()
            .into_iter()
            .map(|t| t.url.unwrap())
            .collect();
        assert_eq!(urls, vec!["https://a.test/", "https://b.test/", "https://c.test/"]);
        assert!(browser.query_tabs().unwrap()[0].pinned);

        assert_eq!(
            panel.undo_close(&mut browser, &mut store, now()).unwrap(),
            UndoOutcome::Nothing
        );
    }

    #[test]
    fn test_undo_survives_host_failure() {
        let (mut browser, ids) = browser_with(&["https://a.test/", "https://b.test/"]);
        let mut store = MemoryStore::new();
        let mut panel = Panel::new(ViewOptions::default());
        panel.close_tabs(&mut browser, &mut store, &ids, false, now()).unwrap();

        browser.set_unavailable(true);
        let failed = panel.undo_close(&mut browser, &mut store, now() + Duration::seconds(2));
        assert!(matches!(failed, Err(AutopsyError::Host(_))));
        assert!(store.get_one(keys::UNDO_LAST_CLOSE).unwrap().is_some());

        browser.set_unavailable(false);
        let outcome = panel
            .undo_close(&mut browser, &mut store, now() + Duration::seconds(4))
            .unwrap();
        assert_eq!(outcome, UndoOutcome::Restored { count: 2 });
        assert_eq!(browser.query_tabs().unwrap().len(), 2);
        assert!(store.get_one(keys::UNDO_LAST_CLOSE).unwrap().is_none());
    }

    #[test]
    fn test_undo_expires() {
        let (mut browser, ids) = browser_with(&["https://a.test/"]);
        let mut store = MemoryStore::new();
        let mut panel = Panel::new(ViewOptions::default()).with_undo_window(Duration::seconds(30));

        panel.close_tabs(&mut browser, &mut store, &ids, false, now()).unwrap();
        let outcome = panel
            .undo_close(&mut browser, &mut store, now() + Duration::seconds(31))
            .unwrap();
        assert_eq!(outcome, UndoOutcome::Expired);
        assert!(browser.query_tabs().unwrap().is_empty());
    }

    #[test]
    fn test_focus_activates_tab() {
        let (mut browser, ids) = browser_with(&["https://a.test/", "https://b.test/"]);
        let panel = Panel::new(ViewOptions::default());
        panel.focus(&mut browser, ids[1]).unwrap();

        let tabs = browser.query_tabs().unwrap();
        assert!(!tabs[0].active);
        assert!(tabs[1].active);
        assert!(matches!(
            panel.focus(&mut browser, 999),
            Err(AutopsyError::TabNotFound(999))
        ));
    }
}

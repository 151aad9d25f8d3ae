//! File-backed stand-in for the host browser
//!
//! Keeps the open tabs in a JSON state file. Mutations go through the
//! [`Browser`] trait and queue the lifecycle events a real browser would fire,
//! so callers drain them with [`SimulatedBrowser::take_events`] and hand them
//! to the tracker. Recorded events from a replay log are applied with
//! [`SimulatedBrowser::apply`], which mutates state without queueing.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Browser, BrowserEvent, NewTab, Tab, TabId, WindowId};
use crate::error::{AutopsyError, Result};

const DEFAULT_WINDOW: WindowId = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedBrowser {
    #[serde(default = "first_tab_id")]
    next_tab_id: TabId,
    #[serde(default)]
    focused_window: Option<WindowId>,
    /// Tabs in window order; `position` is derived from this order
    #[serde(default)]
    tabs: Vec<Tab>,
    #[serde(skip)]
    pending: Vec<BrowserEvent>,
    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(skip)]
    unavailable: bool,
}

fn first_tab_id() -> TabId {
    1
}

impl SimulatedBrowser {
    /// Empty browser with no backing file
    pub fn in_memory() -> Self {
        Self {
            next_tab_id: first_tab_id(),
            ..Self::default()
        }
    }

    /// Load browser state from `path`, starting empty if the file is missing
    pub fn open(path: &Path) -> Result<Self> {
        let mut browser = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<SimulatedBrowser>(&content)?
        } else {
            Self::in_memory()
        };
        browser.path = Some(path.to_path_buf());
        browser.reindex();
        Ok(browser)
    }

    /// Write state back to the file it was opened from
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Make every host query fail, as when the browser API is unavailable
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Drain lifecycle events queued by mutations since the last call
    pub fn take_events(&mut self) -> Vec<BrowserEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Bring state in line with a recorded event
    pub fn apply(&mut self, event: &BrowserEvent) -> Result<()> {
        match event {
            BrowserEvent::Startup { browser_restart } => {
                if *browser_restart {
                    let mut ids = Vec::with_capacity(self.tabs.len());
                    for _ in 0..self.tabs.len() {
                        ids.push(self.allocate_id()?);
                    }
                    for (tab, id) in self.tabs.iter_mut().zip(ids) {
                        tab.id = id;
                    }
                }
            }
            BrowserEvent::Created { tab } => {
                self.remove(tab.id);
                self.next_tab_id = self.next_tab_id.max(tab.id.saturating_add(1));
                self.insert_at(tab.clone(), tab.window_id, Some(tab.position));
            }
            BrowserEvent::Updated { tab_id, url } => {
                let tab = self.tab_mut(*tab_id)?;
                tab.url = Some(url.clone());
            }
            BrowserEvent::Moved {
                tab_id,
                window_id,
                to_index,
                ..
            } => {
                let tab = self.remove(*tab_id).ok_or(AutopsyError::TabNotFound(*tab_id))?;
                self.insert_at(tab, *window_id, Some(*to_index));
            }
            BrowserEvent::Attached {
                tab_id,
                new_window_id,
                new_position,
            } => {
                let tab = self.remove(*tab_id).ok_or(AutopsyError::TabNotFound(*tab_id))?;
                self.insert_at(tab, *new_window_id, Some(*new_position));
            }
            BrowserEvent::Removed { tab_id } => {
                self.remove(*tab_id);
            }
            BrowserEvent::RequestCompleted(_) => {}
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> Result<TabId> {
        let id = self.next_tab_id;
        self.next_tab_id = id
            .checked_add(1)
            .ok_or_else(|| AutopsyError::host("tab ids exhausted"))?;
        Ok(id)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(AutopsyError::host("tab API unavailable"));
        }
        Ok(())
    }

    fn tab_mut(&mut self, id: TabId) -> Result<&mut Tab> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AutopsyError::TabNotFound(id))
    }

    fn remove(&mut self, id: TabId) -> Option<Tab> {
        let index = self.tabs.iter().position(|t| t.id == id)?;
        let tab = self.tabs.remove(index);
        self.reindex();
        Some(tab)
    }

    /// Insert `tab` into `window` before the tab currently at `position`,
    /// or at the end of the window
    fn insert_at(&mut self, mut tab: Tab, window: WindowId, position: Option<usize>) -> usize {
        tab.window_id = window;
        let in_window: Vec<usize> = self
            .tabs
            .iter()
            .enumerate()
            .filter(|(_, t)| t.window_id == window)
            .map(|(i, _)| i)
            .collect();

        let slot = match position.and_then(|p| in_window.get(p)) {
            Some(&index) => index,
            None => in_window.last().map_or(self.tabs.len(), |&last| last + 1),
        };
        let id = tab.id;
        self.tabs.insert(slot, tab);
        self.reindex();
        self.tabs
            .iter()
            .find(|t| t.id == id)
            .map_or(0, |t| t.position)
    }

    fn reindex(&mut self) {
        let mut counters: Vec<(WindowId, usize)> = Vec::new();
        for tab in &mut self.tabs {
            match counters.iter_mut().find(|(w, _)| *w == tab.window_id) {
                Some((_, next)) => {
                    tab.position = *next;
                    *next += 1;
                }
                None => {
                    tab.position = 0;
                    counters.push((tab.window_id, 1));
                }
            }
        }
    }

    fn default_window(&self) -> WindowId {
        self.focused_window
            .or_else(|| self.tabs.first().map(|t| t.window_id))
            .unwrap_or(DEFAULT_WINDOW)
    }
}

impl Browser for SimulatedBrowser {
    fn query_tabs(&self) -> Result<Vec<Tab>> {
        self.ensure_available()?;
        Ok(self.tabs.clone())
    }

    fn get_tab(&self, id: TabId) -> Result<Option<Tab>> {
        self.ensure_available()?;
        Ok(self.tabs.iter().find(|t| t.id == id).cloned())
    }

    fn close_tabs(&mut self, ids: &[TabId]) -> Result<()> {
        self.ensure_available()?;
        for &id in ids {
            if self.remove(id).is_some() {
                self.pending.push(BrowserEvent::Removed { tab_id: id });
            } else {
                debug!(tab_id = id, "Close requested for a tab that is already gone");
            }
        }
        Ok(())
    }

    fn activate(&mut self, id: TabId, window_id: WindowId) -> Result<()> {
        self.ensure_available()?;
        if !self.tabs.iter().any(|t| t.id == id && t.window_id == window_id) {
            return Err(AutopsyError::TabNotFound(id));
        }
        let now = Utc::now();
        for tab in self.tabs.iter_mut().filter(|t| t.window_id == window_id) {
            tab.active = tab.id == id;
            if tab.active {
                tab.last_accessed_at = Some(now);
            }
        }
        self.focused_window = Some(window_id);
        Ok(())
    }

    fn set_pinned(&mut self, id: TabId, pinned: bool) -> Result<()> {
        self.ensure_available()?;
        self.tab_mut(id)?.pinned = pinned;
        Ok(())
    }

    fn move_tab(&mut self, id: TabId, window_id: WindowId, position: usize) -> Result<()> {
        self.ensure_available()?;
        let tab = self.remove(id).ok_or(AutopsyError::TabNotFound(id))?;
        let (from_window, from_index) = (tab.window_id, tab.position);
        let to_index = self.insert_at(tab, window_id, Some(position));

        if from_window == window_id {
            if from_index != to_index {
                self.pending.push(BrowserEvent::Moved {
                    tab_id: id,
                    window_id,
                    from_index,
                    to_index,
                });
            }
        } else {
            self.pending.push(BrowserEvent::Attached {
                tab_id: id,
                new_window_id: window_id,
                new_position: to_index,
            });
        }
        Ok(())
    }

    fn create_tab(&mut self, new_tab: NewTab) -> Result<Tab> {
        self.ensure_available()?;
        let id = self.allocate_id()?;
        let window = new_tab.window_id.unwrap_or_else(|| self.default_window());

        let tab = Tab {
            id,
            url: Some(new_tab.url),
            window_id: window,
            position: 0,
            title: None,
            favicon: None,
            active: false,
            pinned: new_tab.pinned,
            audible: false,
            discarded: false,
            last_accessed_at: Some(Utc::now()),
        };
        self.insert_at(tab, window, new_tab.position);

        let created = self
            .tabs
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(AutopsyError::TabNotFound(id))?;
        self.pending.push(BrowserEvent::Created {
            tab: created.clone(),
        });
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(browser: &mut SimulatedBrowser, url: &str, window: WindowId) -> Tab {
        browser
            .create_tab(NewTab {
                url: url.to_string(),
                window_id: Some(window),
                ..NewTab::default()
            })
            .unwrap()
    }

    #[test]
    fn test_positions_follow_window_order() {
        let mut browser = SimulatedBrowser::in_memory();
        let a = open(&mut browser, "https://a.test/", 1);
        let b = open(&mut browser, "https://b.test/", 2);
        let c = open(&mut browser, "https://c.test/", 1);

        assert_eq!(a.position, 0);
        assert_eq!(b.position, 0);
        assert_eq!(c.position, 1);
    }

    #[test]
    fn test_move_within_window_emits_moved() {
        let mut browser = SimulatedBrowser::in_memory();
        let a = open(&mut browser, "https://a.test/", 1);
        open(&mut browser, "https://b.test/", 1);
        open(&mut browser, "https://c.test/", 1);
        browser.take_events();

        browser.move_tab(a.id, 1, 2).unwrap();
        let events = browser.take_events();
        assert_eq!(
            events,
            vec![BrowserEvent::Moved {
                tab_id: a.id,
                window_id: 1,
                from_index: 0,
                to_index: 2,
            }]
        );
        assert_eq!(browser.get_tab(a.id).unwrap().unwrap().position, 2);
    }

    #[test]
    fn test_move_across_windows_emits_attached() {
        let mut browser = SimulatedBrowser::in_memory();
        let a = open(&mut browser, "https://a.test/", 1);
        open(&mut browser, "https://b.test/", 2);
        browser.take_events();

        browser.move_tab(a.id, 2, 0).unwrap();
        let events = browser.take_events();
        assert_eq!(
            events,
            vec![BrowserEvent::Attached {
                tab_id: a.id,
                new_window_id: 2,
                new_position: 0,
            }]
        );
    }

    #[test]
    fn test_restart_renumbers_tabs() {
        let mut browser = SimulatedBrowser::in_memory();
        let a = open(&mut browser, "https://a.test/", 1);
        browser
            .apply(&BrowserEvent::Startup {
                browser_restart: true,
            })
            .unwrap();

        let tabs = browser.query_tabs().unwrap();
        assert_eq!(tabs.len(), 1);
        assert_ne!(tabs[0].id, a.id);
        assert_eq!(tabs[0].url.as_deref(), Some("https://a.test/"));
    }

    #[test]
    fn test_state_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("browser.json");

        let mut browser = SimulatedBrowser::open(&path).unwrap();
        open(&mut browser, "https://a.test/", 3);
        browser.save().unwrap();

        let reopened = SimulatedBrowser::open(&path).unwrap();
        let tabs = reopened.query_tabs().unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].window_id, 3);
    }

    #[test]
    fn test_replayed_max_tab_id_does_not_overflow() {
        let mut browser = SimulatedBrowser::in_memory();
        let mut tab = open(&mut browser, "https://a.test/", 1);
        tab.id = TabId::MAX;
        browser.apply(&BrowserEvent::Created { tab }).unwrap();

        assert!(browser.get_tab(TabId::MAX).unwrap().is_some());
        assert!(matches!(
            browser.create_tab(NewTab {
                url: "https://b.test/".to_string(),
                ..NewTab::default()
            }),
            Err(AutopsyError::Host(_))
        ));
    }

    #[test]
    fn test_unavailable_host_fails_queries() {
        let mut browser = SimulatedBrowser::in_memory();
        browser.set_unavailable(true);
        assert!(matches!(
            browser.query_tabs(),
            Err(AutopsyError::Host(_))
        ));
    }
}

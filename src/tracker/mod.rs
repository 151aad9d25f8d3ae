//! Activity tracker
//!
//! Owns the durable store and the in-memory network counters. The host
//! invokes one named handler per lifecycle event (or [`ActivityTracker::dispatch`]
//! for a recorded [`BrowserEvent`]); the panel reads back through
//! [`TrackerChannel`].

pub mod identity;
pub mod message;
pub mod network;

pub use identity::{fingerprint, Resolution, ResolvedAge, TabInstance, DEFAULT_INSTANCE_TTL_DAYS};
pub use message::{StatsResponse, TrackerChannel, TrackerRequest};
pub use network::{NetworkMonitor, NetworkStats};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::browser::{Browser, BrowserEvent, RequestDetails, Tab, TabId, WindowId};
use crate::error::Result;
use crate::store::KvStore;

pub struct ActivityTracker<S: KvStore> {
    store: S,
    network: NetworkMonitor,
    instance_ttl: Duration,
}

impl<S: KvStore> ActivityTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            network: NetworkMonitor::new(),
            instance_ttl: Duration::days(DEFAULT_INSTANCE_TTL_DAYS),
        }
    }

    pub fn with_instance_ttl(mut self, ttl: Duration) -> Self {
        self.instance_ttl = ttl;
        self
    }

    pub fn with_network(mut self, network: NetworkMonitor) -> Self {
        self.network = network;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NetworkMonitor {
        &mut self.network
    }

    // ============================================
    // LIFECYCLE HANDLERS
    // ============================================

    /// Install/startup pass: sweep stale instances, then reconcile every
    /// open tab against the stored records.
    pub fn on_startup(&mut self, browser: &dyn Browser, now: DateTime<Utc>) -> Result<Vec<ResolvedAge>> {
        let swept = identity::sweep_expired(&mut self.store, now, self.instance_ttl)?;
        let tabs = browser.query_tabs()?;
        let resolved = identity::reconcile_all(&mut self.store, &tabs, now)?;

        info!(
            tabs = tabs.len(),
            resolved = resolved.len(),
            swept,
            "Reconciled tab ages"
        );
        Ok(resolved)
    }

    pub fn on_created(&mut self, tab: &Tab, now: DateTime<Utc>) -> Result<()> {
        let Some(url) = tab.resolved_url() else {
            debug!(tab_id = tab.id, "Created tab has no URL yet, not tracking");
            return Ok(());
        };
        identity::record_new_sitting(&mut self.store, tab.id, url, tab.window_id, tab.position, now)
    }

    /// Navigation starts a new sitting even though the id is unchanged
    pub fn on_updated(&mut self, browser: &dyn Browser, tab_id: TabId, url: &str, now: DateTime<Utc>) -> Result<()> {
        if url.is_empty() {
            return Ok(());
        }
        let Some(tab) = browser.get_tab(tab_id)? else {
            debug!(tab_id, "Updated tab is gone");
            return Ok(());
        };
        identity::record_new_sitting(&mut self.store, tab_id, url, tab.window_id, tab.position, now)
    }

    pub fn on_moved(
        &mut self,
        browser: &dyn Browser,
        tab_id: TabId,
        window_id: WindowId,
        from_index: usize,
        to_index: usize,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(url) = self.current_url(browser, tab_id)? else {
            return Ok(());
        };
        identity::relocate(&mut self.store, &url, window_id, from_index, to_index, now)?;
        Ok(())
    }

    pub fn on_attached(
        &mut self,
        browser: &dyn Browser,
        tab_id: TabId,
        new_window_id: WindowId,
        new_position: usize,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(url) = self.current_url(browser, tab_id)? else {
            return Ok(());
        };
        let live = browser.query_tabs()?;
        let created_at = identity::reattach(
            &mut self.store,
            tab_id,
            &url,
            new_window_id,
            new_position,
            &live,
            now,
        )?;
        debug!(tab_id, new_window_id, %created_at, "Tab attached to new window");
        Ok(())
    }

    pub fn on_removed(&mut self, tab_id: TabId) -> Result<()> {
        self.network.forget(tab_id);
        identity::forget_tab(&mut self.store, tab_id)
    }

    pub fn on_request_completed(&mut self, details: &RequestDetails) {
        self.network.record(details);
    }

    /// Route a recorded event to its handler. A startup event also models a
    /// tracker restart, which drops the in-memory counters.
    pub fn dispatch(&mut self, browser: &dyn Browser, event: &BrowserEvent, now: DateTime<Utc>) -> Result<()> {
        match event {
            BrowserEvent::Startup { .. } => {
                self.network.reset();
                self.on_startup(browser, now)?;
            }
            BrowserEvent::Created { tab } => self.on_created(tab, now)?,
            BrowserEvent::Updated { tab_id, url } => self.on_updated(browser, *tab_id, url, now)?,
            BrowserEvent::Moved {
                tab_id,
                window_id,
                from_index,
                to_index,
            } => self.on_moved(browser, *tab_id, *window_id, *from_index, *to_index, now)?,
            BrowserEvent::Attached {
                tab_id,
                new_window_id,
                new_position,
            } => self.on_attached(browser, *tab_id, *new_window_id, *new_position, now)?,
            BrowserEvent::Removed { tab_id } => self.on_removed(*tab_id)?,
            BrowserEvent::RequestCompleted(details) => self.on_request_completed(details),
        }
        Ok(())
    }

    /// Answer a panel query
    pub fn handle_message(&self, request: TrackerRequest) -> StatsResponse {
        match request {
            TrackerRequest::GetNetworkStats => StatsResponse {
                stats: self.network.snapshot(),
            },
        }
    }

    fn current_url(&self, browser: &dyn Browser, tab_id: TabId) -> Result<Option<String>> {
        let url = browser
            .get_tab(tab_id)?
            .and_then(|tab| tab.resolved_url().map(str::to_string));
        if url.is_none() {
            debug!(tab_id, "Tab has no URL, skipping");
        }
        Ok(url)
    }
}

impl<S: KvStore> TrackerChannel for ActivityTracker<S> {
    fn send(&self, request: TrackerRequest) -> Result<StatsResponse> {
        Ok(self.handle_message(request))
    }
}

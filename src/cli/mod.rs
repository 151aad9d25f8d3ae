//! Command implementations
//!
//! Each command opens a [`Session`]: the durable store, the simulated browser
//! and a tracker over them. Browser mutations queue lifecycle events, which
//! [`Session::flush`] hands to the tracker before saving browser state.
//! Network counters are saved next to the browser state so liveness carries
//! from one command to the next.

pub mod close;
pub mod gc;
pub mod list;
pub mod render;
pub mod replay;
pub mod startup;
pub mod tabs;
pub mod watch;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::collections::BTreeMap;
use tracing::warn;

use crate::browser::{SimulatedBrowser, TabId};
use crate::config::{Config, PanelConfig};
use crate::inspect::{GroupBy, Panel, SortDirection, SortKey, ViewOptions};
use crate::store::SqliteStore;
use crate::tracker::{ActivityTracker, NetworkMonitor, NetworkStats};

/// View selections shared by list, watch, replay and close
#[derive(Debug, Clone, Default, Args)]
pub struct ViewArgs {
    /// Sort column
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    /// Ascending order
    #[arg(long, conflicts_with = "desc")]
    pub asc: bool,

    /// Descending order
    #[arg(long)]
    pub desc: bool,

    /// Group rows into buckets
    #[arg(short, long, value_enum)]
    pub group: Option<GroupBy>,

    /// Case-insensitive match on title or URL
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only tabs at least this many minutes old
    #[arg(long, value_name = "MINUTES")]
    pub older_than: Option<i64>,
}

impl ViewArgs {
    pub fn to_options(&self, panel: &PanelConfig) -> ViewOptions {
        let direction = if self.asc {
            SortDirection::Asc
        } else if self.desc {
            SortDirection::Desc
        } else {
            panel.default_direction
        };

        ViewOptions {
            sort: self.sort.unwrap_or(panel.default_sort),
            direction,
            group: self.group.unwrap_or_default(),
            search: self.search.clone(),
            min_age: self.older_than.map(Duration::minutes),
            status: None,
        }
    }
}

pub struct Session {
    pub config: Config,
    pub browser: SimulatedBrowser,
    pub tracker: ActivityTracker<SqliteStore>,
}

impl Session {
    pub fn open(config: Config) -> Result<Self> {
        let store_path = config.store_path();
        let store = SqliteStore::open(&store_path)
            .with_context(|| format!("opening store {}", store_path.display()))?;
        let browser = Self::load_browser(&config)?;
        let tracker = ActivityTracker::new(store)
            .with_instance_ttl(config.instance_ttl())
            .with_network(Self::load_network(&config)?);

        Ok(Self {
            config,
            browser,
            tracker,
        })
    }

    fn load_browser(config: &Config) -> Result<SimulatedBrowser> {
        let state_path = config.browser_state_path();
        SimulatedBrowser::open(&state_path)
            .with_context(|| format!("loading browser state {}", state_path.display()))
    }

    /// Counters saved by an earlier command. An unreadable file counts as no
    /// activity.
    fn load_network(config: &Config) -> Result<NetworkMonitor> {
        let path = config.network_state_path();
        if !path.exists() {
            return Ok(NetworkMonitor::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading network state {}", path.display()))?;
        match serde_json::from_str::<BTreeMap<TabId, NetworkStats>>(&content) {
            Ok(snapshot) => Ok(NetworkMonitor::from_snapshot(snapshot)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring unreadable network state");
                Ok(NetworkMonitor::new())
            }
        }
    }

    /// Pick up changes other processes made to the browser and network state
    pub fn reload(&mut self) -> Result<()> {
        self.browser = Self::load_browser(&self.config)?;
        *self.tracker.network_mut() = Self::load_network(&self.config)?;
        Ok(())
    }

    /// Write browser state and network counters back to disk
    pub fn save(&self) -> Result<()> {
        self.browser.save().context("saving browser state")?;

        let path = self.config.network_state_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = serde_json::to_string_pretty(&self.tracker.network().snapshot())?;
        std::fs::write(&path, snapshot)
            .with_context(|| format!("saving network state {}", path.display()))?;
        Ok(())
    }

    pub fn panel(&self, options: ViewOptions) -> Panel {
        Panel::new(options)
            .with_confirm_threshold(self.config.panel.confirm_close_threshold)
            .with_undo_window(self.config.undo_window())
    }

    /// Deliver queued lifecycle events to the tracker and save state
    pub fn flush(&mut self, now: DateTime<Utc>) -> Result<()> {
        for event in self.browser.take_events() {
            if let Err(err) = self.tracker.dispatch(&self.browser, &event, now) {
                warn!(error = %err, ?event, "Tracker failed to handle event");
            }
        }
        self.save()
    }
}

//! Replay command: feed a recorded event log through the browser and tracker
//!
//! One JSON object per line:
//! `{"at": 1700000000000, "event": {"type": "created", "tab": {...}}}`.
//! `at` is epoch milliseconds and defaults to the current time. Blank lines
//! and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use super::{render, Session, ViewArgs};
use crate::browser::BrowserEvent;

#[derive(Debug, Deserialize)]
pub struct ReplayLine {
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub at: Option<DateTime<Utc>>,
    pub event: BrowserEvent,
}

pub fn parse_log(content: &str) -> Result<Vec<ReplayLine>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str::<ReplayLine>(line)
                .with_context(|| format!("line {}: invalid event", index + 1))
        })
        .collect()
}

pub fn run(session: &mut Session, path: &Path, view: &ViewArgs) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading event log {}", path.display()))?;
    let lines = parse_log(&content)?;

    let mut now = Utc::now();
    let mut applied = 0;
    for line in &lines {
        now = line.at.unwrap_or_else(Utc::now);
        if let Err(err) = session.browser.apply(&line.event) {
            warn!(error = %err, event = ?line.event, "Event does not match browser state, skipping");
            continue;
        }
        if let Err(err) = session.tracker.dispatch(&session.browser, &line.event, now) {
            warn!(error = %err, event = ?line.event, "Tracker failed to handle event");
        }
        applied += 1;
    }
    session.save()?;

    println!("Replayed {} of {} events from {}\n", applied, lines.len(), path.display());

    let mut panel = session.panel(view.to_options(&session.config.panel));
    let result = panel.refresh(&session.browser, &session.tracker, session.tracker.store(), now);
    render::print_view(&result, now);
    Ok(())
}

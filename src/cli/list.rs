//! List command implementation

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::{render, Session, ViewArgs};

pub fn run(session: &Session, view: &ViewArgs, now: DateTime<Utc>) -> Result<()> {
    let mut panel = session.panel(view.to_options(&session.config.panel));
    let result = panel.refresh(
        &session.browser,
        &session.tracker,
        session.tracker.store(),
        now,
    );
    render::print_view(&result, now);
    Ok(())
}

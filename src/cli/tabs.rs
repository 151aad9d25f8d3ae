//! Single-tab commands and undo

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::Session;
use crate::browser::{NewTab, TabId, WindowId};
use crate::inspect::{UndoOutcome, ViewOptions};

pub fn open(
    session: &mut Session,
    url: String,
    window_id: Option<WindowId>,
    position: Option<usize>,
    pinned: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let panel = session.panel(ViewOptions::default());
    let tab = panel.open(
        &mut session.browser,
        NewTab {
            url,
            window_id,
            position,
            pinned,
        },
    )?;
    session.flush(now)?;
    println!(
        "Opened tab {} in window {} at position {}",
        tab.id, tab.window_id, tab.position
    );
    Ok(())
}

pub fn focus(session: &mut Session, id: TabId, now: DateTime<Utc>) -> Result<()> {
    let panel = session.panel(ViewOptions::default());
    panel.focus(&mut session.browser, id)?;
    session.flush(now)?;
    println!("Focused tab {}", id);
    Ok(())
}

pub fn pin(session: &mut Session, id: TabId, pinned: bool, now: DateTime<Utc>) -> Result<()> {
    let panel = session.panel(ViewOptions::default());
    panel.set_pinned(&mut session.browser, id, pinned)?;
    session.flush(now)?;
    println!("{} tab {}", if pinned { "Pinned" } else { "Unpinned" }, id);
    Ok(())
}

pub fn move_tab(
    session: &mut Session,
    id: TabId,
    window_id: WindowId,
    position: usize,
    now: DateTime<Utc>,
) -> Result<()> {
    let panel = session.panel(ViewOptions::default());
    panel.move_tab(&mut session.browser, id, window_id, position)?;
    session.flush(now)?;
    println!("Moved tab {} to window {} position {}", id, window_id, position);
    Ok(())
}

pub fn undo(session: &mut Session, now: DateTime<Utc>) -> Result<()> {
    let mut panel = session.panel(ViewOptions::default());
    let outcome = panel.undo_close(&mut session.browser, session.tracker.store_mut(), now)?;
    session.flush(now)?;

    match outcome {
        UndoOutcome::Restored { count } => println!("Restored {} tabs", count),
        UndoOutcome::Expired => println!("The last close is too old to undo."),
        UndoOutcome::Nothing => println!("Nothing to undo."),
    }
    Ok(())
}

//! Startup command: the install/startup reconciliation pass

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::Session;
use crate::tracker::Resolution;

pub fn run(session: &mut Session, now: DateTime<Utc>) -> Result<()> {
    let resolved = session.tracker.on_startup(&session.browser, now)?;

    if resolved.is_empty() {
        println!("No tabs with a URL to reconcile.");
        return Ok(());
    }

    let count = |r: Resolution| resolved.iter().filter(|a| a.resolution == r).count();
    println!("Reconciled {} tabs:", resolved.len());
    println!("  exact match      {}", count(Resolution::Exact));
    println!("  repositioned     {}", count(Resolution::Relocated));
    println!("  known URL        {}", count(Resolution::UrlFirstSeen));
    println!("  new              {}", count(Resolution::New));
    Ok(())
}

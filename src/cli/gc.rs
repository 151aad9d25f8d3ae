use anyhow::Result;
use chrono::{DateTime, Utc};

use super::Session;
use crate::tracker::identity;

pub fn run(session: &mut Session, now: DateTime<Utc>) -> Result<()> {
    let ttl = session.config.instance_ttl();
    let removed = identity::sweep_expired(session.tracker.store_mut(), now, ttl)?;
    println!(
        "Removed {} tab instance records unseen for {} days.",
        removed,
        ttl.num_days()
    );
    Ok(())
}

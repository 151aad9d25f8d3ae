//! Close command: bulk close by id or by the current filter

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use super::{Session, ViewArgs};
use crate::browser::TabId;
use crate::inspect::{CloseOutcome, Liveness, PanelView};
use crate::tracker::NetworkMonitor;

/// Without any recorded traffic every tab reads as inactive, so a status
/// filter would match everything.
fn ensure_liveness_known(status: Option<Liveness>, network: &NetworkMonitor) -> Result<()> {
    if status.is_some() && network.is_empty() {
        bail!("no network activity has been recorded yet, so --status cannot tell tabs apart");
    }
    Ok(())
}

pub fn run(
    session: &mut Session,
    ids: Vec<TabId>,
    view: &ViewArgs,
    status: Option<Liveness>,
    confirmed: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let has_filter = view.search.is_some() || view.older_than.is_some() || status.is_some();
    if ids.is_empty() && !has_filter {
        bail!("refusing to close every tab; pass --id, --search, --older-than or --status");
    }
    ensure_liveness_known(status, session.tracker.network())?;

    let mut options = view.to_options(&session.config.panel);
    options.status = status;
    let mut panel = session.panel(options);

    let targets = if ids.is_empty() {
        let result = panel.refresh(
            &session.browser,
            &session.tracker,
            session.tracker.store(),
            now,
        );
        if let PanelView::NoData { reason } = result {
            bail!("could not read tabs: {}", reason);
        }
        panel.filtered_ids(now)
    } else {
        ids
    };

    if targets.is_empty() {
        println!("No tabs match.");
        return Ok(());
    }

    let outcome = panel.close_tabs(
        &mut session.browser,
        session.tracker.store_mut(),
        &targets,
        confirmed,
        now,
    )?;
    session.flush(now)?;

    match outcome {
        CloseOutcome::NeedsConfirmation { count } => {
            println!("This would close {} tabs. Re-run with --yes to confirm.", count);
        }
        CloseOutcome::Closed { count } => {
            println!("Closed {} tabs. Run 'autopsy undo' to restore them.", count);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::RequestDetails;
    use chrono::Utc;

    #[test]
    fn test_status_filter_needs_recorded_traffic() {
        let mut network = NetworkMonitor::new();
        assert!(ensure_liveness_known(Some(Liveness::Inactive), &network).is_err());
        assert!(ensure_liveness_known(None, &network).is_ok());

        network.record(&RequestDetails {
            tab_id: 1,
            timestamp: Utc::now(),
            response_headers: Vec::new(),
        });
        assert!(ensure_liveness_known(Some(Liveness::Inactive), &network).is_ok());
    }
}

//! Watch command: poll and re-render until interrupted

use anyhow::{bail, Result};
use chrono::Utc;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::debug;

use super::{render, Session, ViewArgs};

pub async fn run(
    session: &mut Session,
    view: &ViewArgs,
    interval: Option<u64>,
    ticks: Option<u64>,
) -> Result<()> {
    if ticks == Some(0) {
        bail!("--ticks must be at least 1");
    }
    let period = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| session.config.refresh_interval());
    let mut panel = session.panel(view.to_options(&session.config.panel));
    let clear_screen = std::io::stdout().is_terminal();

    let mut ticker = tokio::time::interval(period);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut rendered: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.reload()?;
                let now = Utc::now();
                let result = panel.refresh(
                    &session.browser,
                    &session.tracker,
                    session.tracker.store(),
                    now,
                );
                if clear_screen {
                    print!("\x1b[2J\x1b[H");
                }
                render::print_view(&result, now);

                rendered += 1;
                if ticks.is_some_and(|limit| rendered >= limit) {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                debug!("Interrupted, stopping watch");
                break;
            }
        }
    }
    Ok(())
}

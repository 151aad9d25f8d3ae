//! Plain-text rendering of the panel

use chrono::{DateTime, Duration, Utc};

use crate::inspect::{host_of, Liveness, PanelView, TabMetrics};

pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "—".to_string();
    }
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1.0 {
        format!("{:.1} MB", mb)
    } else {
        format!("{:.0} KB", bytes as f64 / 1024.0)
    }
}

/// Coarse duration: "2d", "5h", "12m", "<1m"
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d", days)
    } else if hours > 0 {
        format!("{}h", hours)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "<1m".to_string()
    }
}

pub fn format_relative(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = timestamp else {
        return "—".to_string();
    };
    let elapsed = now - ts;
    if elapsed.num_minutes() < 1 {
        "Just now".to_string()
    } else {
        format!("{} ago", format_duration(elapsed))
    }
}

pub fn status_marker(status: Liveness) -> &'static str {
    match status {
        Liveness::Active => "●",
        Liveness::Recent => "◐",
        Liveness::Idle => "○",
        Liveness::Inactive => "✕",
    }
}

pub fn truncate(text: &str, max: usize) -> String {
    let text = text.lines().next().unwrap_or(text);
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn print_row(tab: &TabMetrics, now: DateTime<Utc>) {
    let requests = match tab.network.request_count {
        0 => "—".to_string(),
        n => n.to_string(),
    };
    let flags = format!(
        "{}{}{}",
        if tab.pinned { "📌" } else { "" },
        if tab.audible { "🔊" } else { "" },
        if tab.discarded { "💤" } else { "" },
    );

    println!(
        "{:<2} {:<6} {:<36} {:<22} {:<10} {:<8} {:>6} {:>9} {}",
        status_marker(tab.status(now)),
        tab.id,
        truncate(&tab.title, 36),
        truncate(host_of(&tab.url).as_deref().unwrap_or("-"), 22),
        format_relative(tab.last_accessed_at, now),
        tab.age(now).map(format_duration).unwrap_or_else(|| "—".to_string()),
        requests,
        format_bytes(tab.network.bytes_received),
        flags,
    );
}

pub fn print_view(view: &PanelView, now: DateTime<Utc>) {
    let (groups, summary) = match view {
        PanelView::NoData { reason } => {
            println!("No tab data available ({}). Will retry on next refresh.", reason);
            return;
        }
        PanelView::Loaded { groups, summary } => (groups, summary),
    };

    println!(
        "{} tabs · {} active · {} inactive · showing {}",
        summary.total,
        summary.count(Liveness::Active),
        summary.count(Liveness::Inactive),
        summary.visible,
    );

    if groups.is_empty() {
        println!("\nNo tabs match the current view.");
        return;
    }

    println!(
        "\n{:<2} {:<6} {:<36} {:<22} {:<10} {:<8} {:>6} {:>9}",
        "", "ID", "Tab", "Host", "Last Active", "Age", "Reqs", "Bytes"
    );
    println!("{}", "-".repeat(106));

    let grouped = groups.len() > 1 || groups.iter().any(|g| g.key != "all");
    for group in groups {
        if grouped {
            println!("── {} ({})", group.label, group.tabs.len());
        }
        for tab in &group.tabs {
            print_row(tab, now);
        }
    }
}

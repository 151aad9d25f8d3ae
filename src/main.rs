use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use autopsy::browser::{TabId, WindowId};
use autopsy::cli::{close, gc, list, replay, startup, tabs, watch, Session, ViewArgs};
use autopsy::config::Config;
use autopsy::inspect::Liveness;
use autopsy::logging;

#[derive(Parser)]
#[command(name = "autopsy")]
#[command(about = "Browser tab inspector: ages, liveness and network activity per tab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "autopsy.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the startup reconciliation pass over the open tabs
    Startup,

    /// Replay a recorded event log, then show the panel
    Replay {
        /// JSON lines event log
        path: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show the tab panel
    List {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Open a new tab
    Open {
        url: String,
        /// Target window (defaults to the first window)
        #[arg(short, long)]
        window: Option<WindowId>,
        /// Index inside the window (defaults to the end)
        #[arg(short, long)]
        position: Option<usize>,
        #[arg(long)]
        pinned: bool,
    },

    /// Close tabs by id or by filter
    Close {
        /// Tab ids to close (repeatable)
        #[arg(long = "id")]
        ids: Vec<TabId>,

        #[command(flatten)]
        view: ViewArgs,

        /// Only tabs with this liveness
        #[arg(long, value_enum)]
        status: Option<Liveness>,

        /// Skip the bulk close confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Restore the most recently closed tabs
    Undo,

    /// Focus a tab and its window
    Focus { id: TabId },

    /// Pin or unpin a tab
    Pin {
        id: TabId,
        /// Unpin instead
        #[arg(long)]
        off: bool,
    },

    /// Move a tab to a window and position
    Move {
        id: TabId,
        #[arg(short, long)]
        window: WindowId,
        #[arg(short, long)]
        position: usize,
    },

    /// Re-render the panel periodically until interrupted
    Watch {
        #[command(flatten)]
        view: ViewArgs,
        /// Refresh interval in seconds (defaults to the configured one)
        #[arg(short, long)]
        interval: Option<u64>,
        /// Stop after this many refreshes
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        ticks: Option<u64>,
    },

    /// Remove tab instance records past their TTL
    Gc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_default();
    logging::init(&config.logging);

    let mut session = Session::open(config)?;
    let now = Utc::now();

    match cli.command {
        Commands::Startup => {
            startup::run(&mut session, now)?;
        }
        Commands::Replay { path, view } => {
            replay::run(&mut session, &path, &view)?;
        }
        Commands::List { view } => {
            list::run(&session, &view, now)?;
        }
        Commands::Open {
            url,
            window,
            position,
            pinned,
        } => {
            tabs::open(&mut session, url, window, position, pinned, now)?;
        }
        Commands::Close {
            ids,
            view,
            status,
            yes,
        } => {
            close::run(&mut session, ids, &view, status, yes, now)?;
        }
        Commands::Undo => {
            tabs::undo(&mut session, now)?;
        }
        Commands::Focus { id } => {
            tabs::focus(&mut session, id, now)?;
        }
        Commands::Pin { id, off } => {
            tabs::pin(&mut session, id, !off, now)?;
        }
        Commands::Move {
            id,
            window,
            position,
        } => {
            tabs::move_tab(&mut session, id, window, position, now)?;
        }
        Commands::Watch {
            view,
            interval,
            ticks,
        } => {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(watch::run(&mut session, &view, interval, ticks))?;
        }
        Commands::Gc => {
            gc::run(&mut session, now)?;
        }
    }

    Ok(())
}

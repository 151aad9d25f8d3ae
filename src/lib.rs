pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod store;
pub mod tracker;

pub use browser::{Browser, BrowserEvent, SimulatedBrowser};
pub use config::Config;
pub use error::{AutopsyError, Result};
pub use inspect::{Liveness, Panel, TabMetrics, ViewOptions};
pub use store::{KvStore, MemoryStore, SqliteStore};
pub use tracker::ActivityTracker;

#![deny(unsafe_code)]

mod event;
pub mod inotify_watcher;
mod procfs_scanner;

pub use event::{EventCursor, WatchEvent, batch_triggers_rescan};
pub use inotify_watcher::{InotifyWatcher, WatchEntry};
pub use procfs_scanner::ProcfsScanner;

use chrono::{DateTime, Local};

/// One newly detected process, handed to the presentation sink and then
/// dropped. Fields that could not be read because the process already
/// exited are `None`; the command line falls back to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessObservation {
    pub pid: u32,
    pub uid: Option<u32>,
    pub ppid: Option<i32>,
    pub cmdline: String,
    pub time: DateTime<Local>,
}

/// Presentation seam: receives each observation exactly once, in scan
/// order.
pub trait ObservationSink: Send {
    fn emit(&mut self, observation: &ProcessObservation) -> std::io::Result<()>;
}

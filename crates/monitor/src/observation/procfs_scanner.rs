#![forbid(unsafe_code)]

use crate::error::Error;
use crate::observation::{ObservationSink, ProcessObservation};
use crate::registry::SeenRegistry;
use chrono::Local;
use procfs::process::Process;
use std::ffi::OsStr;
use std::path::PathBuf;
use tracing::{debug, trace};

/// Placeholder printed when a process exits before its command line could
/// be read.
const UNREADABLE_CMDLINE: &str = "???";

/// Enumerates the process table and reports every pid not seen before.
///
/// Attribute reads are best-effort: a process that exits mid-scan is still
/// reported, with placeholders for whatever could no longer be read. A pid
/// reused between enumeration and attribute read surfaces as odd-looking
/// attributes, not as an error.
#[derive(Debug)]
pub struct ProcfsScanner {
    root: PathBuf,
    registry: SeenRegistry,
    max_cmdline: usize,
}

impl ProcfsScanner {
    pub fn new(registry: SeenRegistry, max_cmdline: usize) -> Self {
        Self::with_root("/proc", registry, max_cmdline)
    }

    /// Scan a process table mounted somewhere other than `/proc`.
    pub fn with_root(root: impl Into<PathBuf>, registry: SeenRegistry, max_cmdline: usize) -> Self {
        Self {
            root: root.into(),
            registry,
            max_cmdline,
        }
    }

    /// One full pass over the process table. Returns the number of
    /// observations emitted.
    ///
    /// An unopenable process table is not fatal: the cycle emits nothing
    /// and the next trigger retries.
    pub fn scan(&mut self, sink: &mut dyn ObservationSink) -> Result<usize, Error> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(%err, root = %self.root.display(), "process table unavailable, skipping cycle");
                return Ok(0);
            }
        };

        let mut emitted = 0;
        for entry in entries {
            let Ok(entry) = entry else { continue };
            let Some(pid) = parse_pid(&entry.file_name()) else {
                continue;
            };
            // A digit name beyond the registry capacity cannot be a live
            // pid; treat it as malformed rather than re-reporting it on
            // every cycle.
            if pid as usize >= self.registry.capacity() {
                continue;
            }
            if self.registry.has_seen(pid) {
                continue;
            }
            self.registry.mark_seen(pid);
            let observation = self.observe(pid);
            sink.emit(&observation)?;
            emitted += 1;
        }

        trace!(emitted, "process table scanned");
        Ok(emitted)
    }

    pub fn registry(&self) -> &SeenRegistry {
        &self.registry
    }

    fn observe(&self, pid: u32) -> ProcessObservation {
        let time = Local::now();
        let process = Process::new_with_root(self.root.join(pid.to_string())).ok();

        let uid = process.as_ref().and_then(|p| p.uid().ok());
        let ppid = process.as_ref().and_then(|p| p.stat().ok()).map(|s| s.ppid);
        let cmdline = match process.as_ref().map(|p| p.cmdline()) {
            // An empty command line is a kernel thread, not a read failure.
            Some(Ok(args)) => truncate_chars(args.join(" "), self.max_cmdline),
            Some(Err(_)) | None => UNREADABLE_CMDLINE.to_string(),
        };

        ProcessObservation {
            pid,
            uid,
            ppid,
            cmdline,
            time,
        }
    }
}

/// Parse a directory name as a pid. The name must be ASCII digits in its
/// entirety; partial numeric prefixes like `12a` are rejected.
fn parse_pid(name: &OsStr) -> Option<u32> {
    let name = name.to_str()?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

fn truncate_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        text
    } else {
        text.chars().take(max).collect()
    }
}

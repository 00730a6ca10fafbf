#![forbid(unsafe_code)]

use crate::error::Error;
use crate::observation::{
    EventCursor, InotifyWatcher, ObservationSink, ProcfsScanner, WatchEvent, batch_triggers_rescan,
};
use crate::registry::SeenRegistry;
use config::Config;
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

/// Size of one raw read from the notification channel. Large enough for a
/// batch of events with names.
const EVENT_BUF_LEN: usize = 4096;

/// The trigger loop: one blocking wait per iteration, spanning the
/// notification channel and the scan-interval timeout.
///
/// A timeout falls back to a full scan; a readable channel decodes the
/// batch and rescans once if any non-directory event is present. The loop
/// leaves its waiting state only through the cancellation token or an
/// unrecoverable wait/read error.
pub struct MonitorEngine {
    interval: Duration,
    scanner: ProcfsScanner,
    watcher: InotifyWatcher,
    sink: Box<dyn ObservationSink>,
}

impl MonitorEngine {
    /// Build the engine from configuration: size the registry from the
    /// platform's maximum pid, then open and register the watch channel.
    pub fn new(config: &Config, sink: Box<dyn ObservationSink>) -> Result<Self, Error> {
        let pid_max = procfs::sys::kernel::pid_max()?;
        let registry = SeenRegistry::new(pid_max as usize + 1);
        let scanner = ProcfsScanner::new(registry, config.output.truncate);
        let watcher = InotifyWatcher::register_all(&config.scan.watches)?;
        Ok(Self::from_parts(
            config.scan.interval,
            scanner,
            watcher,
            sink,
        ))
    }

    /// Assemble an engine from already-built parts. Used by tests to point
    /// the scanner at a synthetic process table.
    pub fn from_parts(
        interval: Duration,
        scanner: ProcfsScanner,
        watcher: InotifyWatcher,
        sink: Box<dyn ObservationSink>,
    ) -> Self {
        Self {
            interval,
            scanner,
            watcher,
            sink,
        }
    }

    /// Run until the token is cancelled. Blocks the calling thread; a
    /// pending wait delays cancellation by at most one interval.
    pub fn run(&mut self, cancel: &CancellationToken) -> Result<(), Error> {
        let timeout = poll_timeout(self.interval);
        let mut event_buf = [0u8; EVENT_BUF_LEN];

        // Processes already alive are reported before the first wait;
        // later waves arrive on timeouts and watch events.
        self.scanner.scan(self.sink.as_mut())?;

        loop {
            if cancel.is_cancelled() {
                info!("shutdown requested");
                return Ok(());
            }

            let mut fds = [PollFd::new(self.watcher.fd(), PollFlags::POLLIN)];
            match poll(&mut fds, timeout) {
                // A signal landed mid-wait; re-enter the wait unchanged.
                Err(Errno::EINTR) => continue,
                Err(err) => return Err(Error::WaitFailed(err)),
                Ok(0) => {
                    self.scanner.scan(self.sink.as_mut())?;
                }
                Ok(_) => {
                    let len = match self.watcher.read_batch(&mut event_buf) {
                        Ok(len) => len,
                        Err(Errno::EINTR) => continue,
                        Err(err) => return Err(Error::ChannelRead(err)),
                    };
                    if self.decode_batch(&event_buf[..len])? {
                        self.scanner.scan(self.sink.as_mut())?;
                    }
                }
            }
        }
    }

    fn decode_batch(&self, buf: &[u8]) -> Result<bool, Error> {
        let events = EventCursor::new(buf).collect::<Result<Vec<WatchEvent>, Error>>()?;
        for event in &events {
            trace!(
                wd = event.wd,
                mask = event.mask,
                path = ?self.watcher.path_for(event.wd),
                name = ?event.name,
                dir = event.is_dir(),
                "watch event"
            );
        }
        Ok(batch_triggers_rescan(&events))
    }
}

fn poll_timeout(interval: Duration) -> PollTimeout {
    let millis = i32::try_from(interval.as_millis()).unwrap_or(i32::MAX);
    PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX)
}

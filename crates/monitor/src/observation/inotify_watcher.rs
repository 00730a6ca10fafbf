#![deny(unsafe_code)]

//! Watch registration for the notification channel.
//!
//! Each configured path is registered independently for "file opened"
//! events. A path that cannot be watched degrades to a warning and a
//! sentinel entry; only failure to create the channel itself is fatal,
//! because without it the trigger loop has nothing to wait on.

use crate::error::Error;
use std::ffi::CString;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Pause after a registration warning so an operator can notice it before
/// observation lines start scrolling.
const REGISTRATION_PAUSE: Duration = Duration::from_secs(1);

/// A configured path plus the watch handle the kernel assigned to it.
/// `wd` stays `None` for paths whose registration failed.
#[derive(Debug)]
pub struct WatchEntry {
    path: PathBuf,
    wd: Option<i32>,
}

impl WatchEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_registered(&self) -> bool {
        self.wd.is_some()
    }
}

#[derive(Debug)]
pub struct InotifyWatcher {
    fd: OwnedFd,
    entries: Vec<WatchEntry>,
}

impl InotifyWatcher {
    /// Open the notification channel and register every path on it.
    pub fn register_all<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self, Error> {
        let fd = init_channel()?;
        let mut entries = Vec::new();

        for path in paths {
            let path = path.as_ref().to_path_buf();
            let wd = match add_watch(fd.as_fd(), &path) {
                Ok(wd) => {
                    debug!(path = %path.display(), wd, "watching path");
                    Some(wd)
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        %err,
                        "unable to watch path, short-lived processes may be missed"
                    );
                    if matches!(err.raw_os_error(), Some(libc::ENOSPC) | Some(libc::ENOMEM)) {
                        warn!("consider raising /proc/sys/fs/inotify/max_user_watches");
                    }
                    std::thread::sleep(REGISTRATION_PAUSE);
                    None
                }
            };
            entries.push(WatchEntry { path, wd });
        }

        if !entries.is_empty() && entries.iter().all(|entry| entry.wd.is_none()) {
            warn!("no watch path registered, falling back to interval scans only");
        }

        Ok(Self { fd, entries })
    }

    /// The channel fd, for multiplexed waits.
    pub fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }

    /// One bounded read of the packed event stream. Decode with
    /// [`EventCursor`](crate::observation::EventCursor).
    pub fn read_batch(&self, buf: &mut [u8]) -> nix::Result<usize> {
        nix::unistd::read(&self.fd, buf)
    }

    pub fn entries(&self) -> &[WatchEntry] {
        &self.entries
    }

    pub fn registered_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.is_registered())
            .count()
    }

    /// Resolve a decoded event's watch handle back to its path.
    pub fn path_for(&self, wd: i32) -> Option<&Path> {
        self.entries
            .iter()
            .find(|entry| entry.wd == Some(wd))
            .map(|entry| entry.path.as_path())
    }
}

fn init_channel() -> Result<OwnedFd, Error> {
    #[allow(unsafe_code)]
    let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
    if fd < 0 {
        return Err(Error::ChannelInit(io::Error::last_os_error()));
    }
    // The fd was just returned by the kernel and is owned by nobody else.
    #[allow(unsafe_code)]
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

fn add_watch(fd: BorrowedFd<'_>, path: &Path) -> io::Result<i32> {
    let cpath = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"))?;

    #[allow(unsafe_code)]
    let wd = unsafe { libc::inotify_add_watch(fd.as_raw_fd(), cpath.as_ptr(), libc::IN_OPEN) };
    if wd < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(wd)
    }
}

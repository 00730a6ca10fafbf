#![forbid(unsafe_code)]

//! Decoding of the packed inotify event stream.
//!
//! One `read` from the channel returns zero or more records, each a fixed
//! 16-byte header (wd, mask, cookie, name length) followed by `len` bytes
//! of NUL-padded name. The cursor walks the records bounds-checked; a
//! record that runs past the buffer is an error, not undefined behaviour.

use crate::error::Error;
use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;

const HEADER_LEN: usize = 16;

/// One decoded notification event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub wd: i32,
    pub mask: u32,
    pub name: Option<OsString>,
}

impl WatchEvent {
    /// Whether the changed object is itself a directory. Directory events
    /// are uninteresting as process-activity signals.
    pub fn is_dir(&self) -> bool {
        self.mask & libc::IN_ISDIR != 0
    }
}

/// Bounds-checked iterator over one raw read from the inotify fd.
#[derive(Debug)]
pub struct EventCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> EventCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let chunk = self.buf.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(chunk)
    }
}

impl Iterator for EventCursor<'_> {
    type Item = Result<WatchEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos == self.buf.len() {
            return None;
        }
        let start = self.pos;

        let Some(header) = self.take(HEADER_LEN) else {
            self.pos = self.buf.len();
            return Some(Err(Error::TruncatedEvent(start)));
        };
        // Infallible: the header chunk is exactly 16 bytes.
        let wd = i32::from_ne_bytes(header[0..4].try_into().unwrap());
        let mask = u32::from_ne_bytes(header[4..8].try_into().unwrap());
        let len = u32::from_ne_bytes(header[12..16].try_into().unwrap()) as usize;

        let Some(raw_name) = self.take(len) else {
            self.pos = self.buf.len();
            return Some(Err(Error::TruncatedEvent(start)));
        };
        // The name field is padded with NULs up to `len`.
        let name_end = raw_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(raw_name.len());
        let name = (name_end > 0)
            .then(|| OsString::from(std::ffi::OsStr::from_bytes(&raw_name[..name_end])));

        Some(Ok(WatchEvent { wd, mask, name }))
    }
}

/// One scan per batch: a batch warrants a rescan when it contains at least
/// one non-directory event.
pub fn batch_triggers_rescan<'a>(events: impl IntoIterator<Item = &'a WatchEvent>) -> bool {
    events.into_iter().any(|event| !event.is_dir())
}

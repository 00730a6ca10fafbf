#![forbid(unsafe_code)]

//! Renders one line of text per observation.
//!
//! Line shape: `HH:MM:SS :: UID=...   PID=...    [PPID=...   ]| cmdline`,
//! optionally wrapped in an ANSI colour derived from the owning UID so the
//! same user is always printed in the same colour.

use crate::observation::{ObservationSink, ProcessObservation};
use std::io::Write;

const COLOUR_RESET: &str = "\x1B[39m";
const PLACEHOLDER: &str = "???";

/// Writes observations to any `Write`, stdout in production.
#[derive(Debug)]
pub struct LinePrinter<W> {
    out: W,
    colour: bool,
    show_ppid: bool,
}

impl<W: Write + Send> LinePrinter<W> {
    pub fn new(out: W, colour: bool, show_ppid: bool) -> Self {
        Self {
            out,
            colour,
            show_ppid,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ObservationSink for LinePrinter<W> {
    fn emit(&mut self, observation: &ProcessObservation) -> std::io::Result<()> {
        let time = observation.time.format("%H:%M:%S");
        write!(self.out, "{time} :: ")?;

        let coloured = self.colour && observation.uid.is_some();
        if let Some(uid) = observation.uid.filter(|_| self.colour) {
            write!(self.out, "\x1B[{}m", colour_code(uid))?;
        }

        match observation.uid {
            Some(uid) => write!(self.out, "UID={uid:<6}")?,
            None => write!(self.out, "UID={PLACEHOLDER:<6}")?,
        }
        write!(self.out, "PID={:<7}", observation.pid)?;

        if self.show_ppid {
            match observation.ppid {
                Some(ppid) => write!(self.out, "PPID={ppid:<7}")?,
                None => write!(self.out, "PPID={PLACEHOLDER:<7}")?,
            }
        }

        write!(self.out, "| {}", observation.cmdline)?;
        if coloured {
            write!(self.out, "{COLOUR_RESET}")?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

/// Pick one of six bright foreground colours (91..=96) from a stable hash
/// of the decimal UID, so colours survive restarts and match across hosts.
fn colour_code(uid: u32) -> u32 {
    fnv32(uid.to_string().as_bytes()) % 6 + 91
}

/// 32-bit FNV-1a.
fn fnv32(data: &[u8]) -> u32 {
    const FNV_OFFSET_32: u32 = 2_166_136_261;
    const FNV_PRIME_32: u32 = 16_777_619;
    data.iter().fold(FNV_OFFSET_32, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME_32)
    })
}

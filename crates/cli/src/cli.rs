use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use config::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// procspy: watch processes appear without root
///
/// procspy scans the process table and prints one line for every process it
/// has not reported before. Between periodic scans it waits for file-open
/// events on paths touched during process start-up (the dynamic-linker
/// cache by default), so most short-lived processes are caught well before
/// the next interval elapses.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// If not provided, the default locations are checked. They are
    /// `/etc/procspy/config.toml` and `/etc/procspy/config.d/*.toml`, where
    /// the latter being a glob pattern. If they don't exist, the default
    /// configuration is used.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Only print the first INT characters of each process's command line.
    #[arg(short, long, value_name = "INT")]
    pub truncate: Option<usize>,

    /// How often to scan the process table, in milliseconds.
    #[arg(short, long, value_name = "INT")]
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Do not colour code lines according to uid.
    #[arg(short = 'n', long)]
    pub no_colour: bool,

    /// Include ppids of the processes in the output.
    #[arg(short, long)]
    pub ppid: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

impl Cli {
    /// Command-line flags win over the configuration file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(truncate) = self.truncate {
            config.output.truncate = truncate;
        }
        if let Some(interval) = self.interval {
            config.scan.interval = Duration::from_millis(interval);
        }
        if self.no_colour {
            config.output.colour = false;
        }
        if self.ppid {
            config.output.ppid = true;
        }
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

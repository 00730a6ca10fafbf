use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::path::PathBuf;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Scan {
    /// How long the trigger loop waits for a watch event before falling
    /// back to a full process-table scan. **Measured in milliseconds**.
    ///
    /// ## Note
    ///
    /// This is the worst-case detection latency for a process that never
    /// touches a watched path. Lowering it increases scan frequency and
    /// CPU cost accordingly.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub interval: Duration,

    /// Paths registered for "file opened" notifications. An open on any of
    /// them triggers an immediate rescan. The dynamic-linker cache is the
    /// default because nearly every process start touches it when loading
    /// shared libraries.
    ///
    /// Each path registers independently; one that cannot be watched is
    /// logged and skipped, the rest keep working.
    pub watches: Vec<PathBuf>,
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(55),
            watches: vec![PathBuf::from("/etc/ld.so.cache")],
        }
    }
}

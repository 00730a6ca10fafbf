use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Output {
    /// Number of characters of each command line to print. Longer command
    /// lines are cut at exactly this many characters.
    pub truncate: usize,

    /// Colour each line by the owning user ID. The colour is a stable hash
    /// of the UID, so the same user always gets the same colour.
    pub colour: bool,

    /// Include the parent process ID column in the output.
    pub ppid: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            truncate: 125,
            colour: true,
            ppid: false,
        }
    }
}

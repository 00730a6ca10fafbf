#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read maximum pid from procfs: {0}")]
    PidMaxUnavailable(#[from] procfs::ProcError),

    #[error("Failed to create inotify channel: {0}")]
    ChannelInit(#[source] std::io::Error),

    #[error("Failed to read from inotify channel: {0}")]
    ChannelRead(#[source] nix::Error),

    #[error("Truncated inotify event record at offset {0}")]
    TruncatedEvent(usize),

    #[error("Wait on notification channel failed: {0}")]
    WaitFailed(#[source] nix::Error),

    #[error("Failed to write observation: {0}")]
    ObservationWrite(#[from] std::io::Error),
}

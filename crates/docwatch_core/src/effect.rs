use crate::{OwnerId, Token};

/// Work the async driver must perform after an [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEffect {
    /// Fetch the page once and report a `CheckCompleted`.
    CheckPage { token: Token },
    /// Sleep one poll interval (cancellable), then report `Tick`.
    WaitInterval,
    /// Remove this watcher's own request from the store and report `DeleteCompleted`.
    DeleteToken { owner: OwnerId, token: Token },
    /// Sleep the delete retry backoff (cancellable), then report `Tick`.
    WaitRetry,
    Deliver { owner: OwnerId, text: String },
    /// The watcher is finished; no further messages are accepted.
    Stop,
}

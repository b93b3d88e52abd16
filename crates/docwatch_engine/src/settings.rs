use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of wall-clock time for creation and match timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Timing knobs shared by every watcher of one supervisor.
#[derive(Clone)]
pub struct WatchSettings {
    /// Pause between two checks of the same token.
    pub poll_interval: Duration,
    /// Store deletes tried after a match before giving up (at least one).
    pub delete_attempts: u32,
    pub delete_retry_backoff: Duration,
    /// How long `shutdown` waits for watchers before abandoning them.
    pub shutdown_timeout: Duration,
    pub clock: Clock,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            delete_attempts: 3,
            delete_retry_backoff: Duration::from_secs(2),
            shutdown_timeout: Duration::from_secs(10),
            clock: system_clock(),
        }
    }
}

impl WatchSettings {
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

impl fmt::Debug for WatchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSettings")
            .field("poll_interval", &self.poll_interval)
            .field("delete_attempts", &self.delete_attempts)
            .field("delete_retry_backoff", &self.delete_retry_backoff)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

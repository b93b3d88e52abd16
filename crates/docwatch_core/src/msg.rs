use std::fmt;

use chrono::{DateTime, Utc};

/// Result of one page check. A failed check is `Unknown`, never `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Found,
    NotFound,
    Unknown(String),
}

impl CheckOutcome {
    pub fn from_result<E: fmt::Display>(result: Result<bool, E>) -> Self {
        match result {
            Ok(true) => CheckOutcome::Found,
            Ok(false) => CheckOutcome::NotFound,
            Err(err) => CheckOutcome::Unknown(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMsg {
    /// The poll interval or the delete retry backoff elapsed.
    Tick,
    /// A page check finished at `at`.
    CheckCompleted {
        outcome: CheckOutcome,
        at: DateTime<Utc>,
    },
    /// The owner or the supervisor asked this watcher to stop.
    CancelRequested,
    /// The store answered a delete request.
    DeleteCompleted(Result<(), String>),
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OwnerId, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Pending,
    Fulfilled,
    Cancelled,
}

/// One user's request to be told when `token` shows up on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRequest {
    pub owner: OwnerId,
    pub token: Token,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: RequestStatus,
}

impl TrackingRequest {
    pub fn pending(owner: OwnerId, token: Token, created_at: DateTime<Utc>) -> Self {
        Self {
            owner,
            token,
            created_at,
            status: RequestStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchPhase {
    #[default]
    Polling,
    /// Token seen on the page; waiting for the store to retire it.
    Matched,
    Cancelled,
    Done,
}

/// State of a single watcher, advanced only by [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchState {
    request: TrackingRequest,
    phase: WatchPhase,
    checks: u32,
    failed_checks: u32,
    delete_attempts: u32,
    max_delete_attempts: u32,
    elapsed: Option<String>,
}

impl WatchState {
    /// `max_delete_attempts` is clamped to at least one attempt.
    pub fn new(request: TrackingRequest, max_delete_attempts: u32) -> Self {
        Self {
            request,
            phase: WatchPhase::Polling,
            checks: 0,
            failed_checks: 0,
            delete_attempts: 0,
            max_delete_attempts: max_delete_attempts.max(1),
            elapsed: None,
        }
    }

    pub fn request(&self) -> &TrackingRequest {
        &self.request
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    /// Completed checks with a definite answer.
    pub fn checks(&self) -> u32 {
        self.checks
    }

    pub fn failed_checks(&self) -> u32 {
        self.failed_checks
    }

    pub fn delete_attempts(&self) -> u32 {
        self.delete_attempts
    }

    /// Formatted elapsed time, set once the token has been seen.
    pub fn elapsed(&self) -> Option<&str> {
        self.elapsed.as_deref()
    }

    /// A matched watcher that ran out of delete attempts.
    pub fn is_stalled(&self) -> bool {
        self.phase == WatchPhase::Matched && self.delete_attempts >= self.max_delete_attempts
    }

    pub(crate) fn set_phase(&mut self, phase: WatchPhase) {
        self.phase = phase;
        match phase {
            WatchPhase::Done => self.request.status = RequestStatus::Fulfilled,
            WatchPhase::Cancelled => self.request.status = RequestStatus::Cancelled,
            WatchPhase::Polling | WatchPhase::Matched => {}
        }
    }

    pub(crate) fn record_check(&mut self, definite: bool) {
        if definite {
            self.checks += 1;
        } else {
            self.failed_checks += 1;
        }
    }

    pub(crate) fn record_delete_attempt(&mut self) -> bool {
        self.delete_attempts += 1;
        self.delete_attempts < self.max_delete_attempts
    }

    pub(crate) fn set_elapsed(&mut self, text: String) {
        self.elapsed = Some(text);
    }
}

use std::sync::{Mutex, PoisonError};

use docwatch_core::{OwnerId, Token, TrackingRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{owner} already has a pending request for {token}")]
    Duplicate { owner: OwnerId, token: Token },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

/// Durable set of pending requests, unique per `(owner, token)`.
///
/// Implementations must be safe to call from many watchers at once.
pub trait Store: Send + Sync {
    /// Persists a new pending request; `Duplicate` if the pair is already stored.
    fn create(&self, request: &TrackingRequest) -> Result<(), StoreError>;
    /// Removes the owner's request for `token`, whichever registration it is.
    /// Removing an absent request succeeds.
    fn delete(&self, owner: OwnerId, token: &Token) -> Result<(), StoreError>;
    /// Removes exactly `request`: same owner, token and `created_at`. A newer
    /// registration of the same pair is left alone. Absent requests succeed.
    fn retire(&self, request: &TrackingRequest) -> Result<(), StoreError>;
    fn load_all(&self) -> Result<Vec<TrackingRequest>, StoreError>;
}

/// Volatile store, for tests and for running without a state file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    requests: Mutex<Vec<TrackingRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requests(requests: Vec<TrackingRequest>) -> Self {
        Self {
            requests: Mutex::new(requests),
        }
    }

}

impl Store for MemoryStore {
    fn create(&self, request: &TrackingRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        if requests
            .iter()
            .any(|r| r.owner == request.owner && r.token == request.token)
        {
            return Err(StoreError::Duplicate {
                owner: request.owner,
                token: request.token.clone(),
            });
        }
        requests.push(request.clone());
        Ok(())
    }

    fn delete(&self, owner: OwnerId, token: &Token) -> Result<(), StoreError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| !(r.owner == owner && &r.token == token));
        Ok(())
    }

    fn retire(&self, request: &TrackingRequest) -> Result<(), StoreError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|r| !is_same_registration(r, request));
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<TrackingRequest>, StoreError> {
        Ok(self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// One registration is identified by owner, token and creation time.
pub fn is_same_registration(stored: &TrackingRequest, request: &TrackingRequest) -> bool {
    stored.owner == request.owner
        && stored.token == request.token
        && stored.created_at == request.created_at
}

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use docwatch_core::{OwnerId, Token, TrackingRequest};
use docwatch_engine::{is_same_registration, AtomicFileWriter, Store, StoreError};
use docwatch_logging::{watch_error, watch_info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    requests: Vec<TrackingRequest>,
}

/// Pending requests kept in one RON file.
///
/// The file is read once on open; every change rewrites it atomically and is
/// applied in memory only after the write succeeded.
pub struct RonStore {
    writer: AtomicFileWriter,
    requests: Mutex<Vec<TrackingRequest>>,
}

impl RonStore {
    /// Missing file means an empty store. An unreadable file is an error, so
    /// pending requests are never silently overwritten.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let writer = AtomicFileWriter::new(path);
        let requests = match writer
            .read()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?
        {
            Some(text) => {
                let state: PersistedState = ron::from_str(&text)
                    .map_err(|err| StoreError::Corrupt(err.to_string()))?;
                state.requests
            }
            None => Vec::new(),
        };
        watch_info!(
            "Loaded {} stored requests from {:?}",
            requests.len(),
            writer.path()
        );
        Ok(Self {
            writer,
            requests: Mutex::new(requests),
        })
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    fn save(&self, requests: &[TrackingRequest]) -> Result<(), StoreError> {
        let state = PersistedState {
            requests: requests.to_vec(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&state, pretty)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        self.writer.write(&content).map_err(|err| {
            watch_error!("Failed to write state to {:?}: {}", self.writer.path(), err);
            StoreError::Unavailable(err.to_string())
        })
    }

    /// Drops every request matching `doomed`; the file is only rewritten if
    /// something was dropped.
    fn remove_where(&self, doomed: impl Fn(&TrackingRequest) -> bool) -> Result<(), StoreError> {
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = requests.clone();
        next.retain(|r| !doomed(r));
        if next.len() == requests.len() {
            return Ok(());
        }
        self.save(&next)?;
        *requests = next;
        Ok(())
    }
}

impl Store for RonStore {
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
        let mut next = requests.clone();
        next.push(request.clone());
        self.save(&next)?;
        *requests = next;
        Ok(())
    }

    fn delete(&self, owner: OwnerId, token: &Token) -> Result<(), StoreError> {
        self.remove_where(|r| r.owner == owner && &r.token == token)
    }

    fn retire(&self, request: &TrackingRequest) -> Result<(), StoreError> {
        self.remove_where(|r| is_same_registration(r, request))
    }

    fn load_all(&self) -> Result<Vec<TrackingRequest>, StoreError> {
        Ok(self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use docwatch_core::{
    parse_tracking_number, ActiveWatch, OwnerId, RequestStatus, Token, TokenError,
    TrackingRequest,
};
use docwatch_logging::{watch_error, watch_info, watch_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::watcher::{run_watcher, WatcherDeps, WatcherReport};
use crate::TrackerError;

/// Predicate turning raw chat text into a token.
pub type TokenRule = fn(&str) -> Result<Token, TokenError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchKey {
    pub owner: OwnerId,
    pub token: Token,
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.token)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub spawned: usize,
    /// Stored requests that were not resumed, with the reason.
    pub skipped: Vec<(WatchKey, String)>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub finished: Vec<WatcherReport>,
    /// Watchers still running when the drain timeout expired; they were aborted.
    pub abandoned: Vec<WatchKey>,
    /// Watchers whose task panicked.
    pub failed: Vec<WatchKey>,
}

struct LiveEntry {
    id: u64,
    created_at: DateTime<Utc>,
    cancel: CancellationToken,
    handle: JoinHandle<WatcherReport>,
}

#[derive(Default)]
struct LiveSet {
    entries: HashMap<WatchKey, LiveEntry>,
    /// Cancelled watchers that may still be finishing a fetch.
    stopping: Vec<(WatchKey, JoinHandle<WatcherReport>)>,
    next_id: u64,
    closed: bool,
}

impl LiveSet {
    fn admit(&self, key: &WatchKey) -> Result<(), TrackerError> {
        if self.closed {
            return Err(TrackerError::ShuttingDown);
        }
        if self.entries.contains_key(key) {
            return Err(TrackerError::Duplicate {
                owner: key.owner,
                token: key.token.clone(),
            });
        }
        Ok(())
    }

    fn retire(&mut self, key: WatchKey, entry: LiveEntry) {
        entry.cancel.cancel();
        self.stopping.retain(|(_, handle)| !handle.is_finished());
        self.stopping.push((key, entry.handle));
    }
}

/// Removes a watcher's live entry when its task ends, including by panic or abort.
struct EntryGuard {
    live: Arc<Mutex<LiveSet>>,
    key: WatchKey,
    id: u64,
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if live.entries.get(&self.key).map(|entry| entry.id) == Some(self.id) {
            live.entries.remove(&self.key);
        }
    }
}

/// Owns the live watchers, at most one per `(owner, token)`.
///
/// Spawning methods must be called from within a Tokio runtime.
pub struct RequestSupervisor {
    deps: Arc<WatcherDeps>,
    live: Arc<Mutex<LiveSet>>,
    token_rule: TokenRule,
}

impl RequestSupervisor {
    pub fn new(deps: WatcherDeps) -> Self {
        Self {
            deps: Arc::new(deps),
            live: Arc::new(Mutex::new(LiveSet::default())),
            token_rule: parse_tracking_number,
        }
    }

    pub fn with_token_rule(mut self, rule: TokenRule) -> Self {
        self.token_rule = rule;
        self
    }

    pub fn deps(&self) -> &WatcherDeps {
        &self.deps
    }

    fn lock(&self) -> MutexGuard<'_, LiveSet> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates, persists and starts watching a new request.
    ///
    /// The live set is not locked while the store writes; it is checked
    /// before and again after, and a registration that lost a race is
    /// removed from the store again.
    pub fn register(&self, owner: OwnerId, raw: &str) -> Result<Token, TrackerError> {
        let token = (self.token_rule)(raw)?;
        let key = WatchKey {
            owner,
            token: token.clone(),
        };
        self.lock().admit(&key)?;

        let request = TrackingRequest::pending(owner, token.clone(), self.deps.settings.now());
        self.deps.store.create(&request)?;

        let mut live = self.lock();
        let admitted = live.admit(&key);
        if let Err(err) = admitted {
            drop(live);
            if let Err(undo) = self.deps.store.retire(&request) {
                watch_error!("could not undo registration of {}: {}", key, undo);
            }
            return Err(err);
        }
        self.spawn_locked(&mut live, key, request);
        watch_info!("registered {} for {}", token, owner);
        Ok(token)
    }

    /// Resumes every persisted request. Never writes to the store.
    pub fn recover(&self) -> Result<RecoveryReport, TrackerError> {
        let requests = self
            .deps
            .store
            .load_all()
            .map_err(TrackerError::Persistence)?;

        let mut report = RecoveryReport::default();
        let mut live = self.lock();
        if live.closed {
            return Err(TrackerError::ShuttingDown);
        }
        for request in requests {
            let key = WatchKey {
                owner: request.owner,
                token: request.token.clone(),
            };
            if request.status != RequestStatus::Pending {
                watch_warn!("not resuming {}: status {:?}", key, request.status);
                report
                    .skipped
                    .push((key, format!("status {:?}", request.status)));
                continue;
            }
            if live.entries.contains_key(&key) {
                watch_warn!("not resuming {}: already watched", key);
                report.skipped.push((key, "already watched".to_string()));
                continue;
            }
            self.spawn_locked(&mut live, key, request);
            report.spawned += 1;
        }
        watch_info!(
            "recovered {} watchers, skipped {}",
            report.spawned,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Stops one watcher. The stored request is left untouched.
    pub fn cancel(&self, owner: OwnerId, token: &Token) -> Result<(), TrackerError> {
        let key = WatchKey {
            owner,
            token: token.clone(),
        };
        let mut live = self.lock();
        let Some(entry) = live.entries.remove(&key) else {
            return Err(TrackerError::NotFound {
                owner,
                token: token.clone(),
            });
        };
        watch_info!("cancelling {}", key);
        live.retire(key, entry);
        Ok(())
    }

    /// Stops every watcher of one owner and returns their tokens.
    pub fn cancel_owner(&self, owner: OwnerId) -> Vec<Token> {
        let mut live = self.lock();
        let keys: Vec<WatchKey> = live
            .entries
            .keys()
            .filter(|key| key.owner == owner)
            .cloned()
            .collect();
        let mut tokens = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(entry) = live.entries.remove(&key) {
                watch_info!("cancelling {}", key);
                tokens.push(key.token.clone());
                live.retire(key, entry);
            }
        }
        tokens.sort();
        tokens
    }

    /// Deletes a stored request. Pair with `cancel` to drop a request for good.
    pub fn forget(&self, owner: OwnerId, token: &Token) -> Result<(), TrackerError> {
        self.deps
            .store
            .delete(owner, token)
            .map_err(TrackerError::Persistence)
    }

    /// The owner's persisted requests, watched or not, oldest first.
    pub fn stored(&self, owner: OwnerId) -> Result<Vec<TrackingRequest>, TrackerError> {
        let mut requests: Vec<TrackingRequest> = self
            .deps
            .store
            .load_all()
            .map_err(TrackerError::Persistence)?
            .into_iter()
            .filter(|request| request.owner == owner)
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.token.cmp(&b.token)));
        Ok(requests)
    }

    pub fn is_live(&self, owner: OwnerId, token: &Token) -> bool {
        self.lock().entries.contains_key(&WatchKey {
            owner,
            token: token.clone(),
        })
    }

    pub fn live_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Live watches of one owner, oldest first.
    pub fn active(&self, owner: OwnerId) -> Vec<ActiveWatch> {
        let live = self.lock();
        let mut watches: Vec<ActiveWatch> = live
            .entries
            .iter()
            .filter(|(key, _)| key.owner == owner)
            .map(|(key, entry)| ActiveWatch {
                token: key.token.clone(),
                created_at: entry.created_at,
                checking: true,
            })
            .collect();
        watches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.token.cmp(&b.token)));
        watches
    }

    /// Cancels every watcher and waits for them up to the drain timeout.
    ///
    /// Later registrations and recoveries fail with `ShuttingDown`.
    pub async fn shutdown(&self) -> ShutdownReport {
        let handles = {
            let mut live = self.lock();
            live.closed = true;
            let entries: Vec<(WatchKey, LiveEntry)> = live.entries.drain().collect();
            let mut handles = std::mem::take(&mut live.stopping);
            for (key, entry) in entries {
                entry.cancel.cancel();
                handles.push((key, entry.handle));
            }
            handles
        };
        watch_info!("shutting down {} watchers", handles.len());

        let deadline = tokio::time::Instant::now() + self.deps.settings.shutdown_timeout;
        let mut report = ShutdownReport::default();
        for (key, mut handle) in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(finished)) => report.finished.push(finished),
                Ok(Err(err)) => {
                    watch_error!("watcher {} failed: {}", key, err);
                    report.failed.push(key);
                }
                Err(_) => {
                    handle.abort();
                    watch_warn!("abandoning watcher {} after drain timeout", key);
                    report.abandoned.push(key);
                }
            }
        }
        report
    }

    fn spawn_locked(&self, live: &mut LiveSet, key: WatchKey, request: TrackingRequest) {
        let id = live.next_id;
        live.next_id += 1;
        let cancel = CancellationToken::new();
        let created_at = request.created_at;

        let guard = EntryGuard {
            live: Arc::clone(&self.live),
            key: key.clone(),
            id,
        };
        let deps = Arc::clone(&self.deps);
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            run_watcher(request, &deps, task_cancel).await
        });

        live.entries.insert(
            key,
            LiveEntry {
                id,
                created_at,
                cancel,
                handle,
            },
        );
    }
}

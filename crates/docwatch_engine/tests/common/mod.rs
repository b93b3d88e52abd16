#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use docwatch_core::{OwnerId, Token, TrackingRequest};
use docwatch_engine::{
    Clock, FailureKind, FetchError, MemoryStore, Notice, Notifier, NotifyError, PageChecker,
    Store, StoreError, WatchSettings, WatcherDeps,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(docwatch_logging::initialize_for_tests);
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, 8, 0, 0).unwrap()
}

/// Wall clock that follows Tokio's (possibly paused) clock from `base`.
pub fn tokio_clock(base: DateTime<Utc>) -> Clock {
    let start = tokio::time::Instant::now();
    Arc::new(move || base + TimeDelta::from_std(start.elapsed()).unwrap_or_default())
}

pub fn settings(poll_interval: Duration) -> WatchSettings {
    WatchSettings {
        poll_interval,
        delete_attempts: 3,
        delete_retry_backoff: Duration::from_secs(1),
        shutdown_timeout: Duration::from_secs(5),
        clock: tokio_clock(base_time()),
    }
}

pub fn network_error() -> FetchError {
    FetchError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    }
}

pub fn token(text: &str) -> Token {
    Token::new(text).unwrap()
}

pub fn pending(owner: i64, text: &str, created_at: DateTime<Utc>) -> TrackingRequest {
    TrackingRequest::pending(OwnerId(owner), token(text), created_at)
}

/// Page checker answering from a per-token script; unscripted checks say "absent".
#[derive(Default)]
pub struct ScriptedChecker {
    scripts: Mutex<HashMap<Token, VecDeque<Result<bool, FetchError>>>>,
    hanging: Mutex<Vec<Token>>,
    calls: Mutex<Vec<(Token, tokio::time::Instant)>>,
}

impl ScriptedChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, text: &str, answers: Vec<Result<bool, FetchError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(token(text), answers.into());
        self
    }

    /// Checks for `text` never complete.
    pub fn hang(self, text: &str) -> Self {
        self.hanging.lock().unwrap().push(token(text));
        self
    }

    pub fn calls_for(&self, text: &str) -> Vec<tokio::time::Instant> {
        let wanted = token(text);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == wanted)
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait::async_trait]
impl PageChecker for ScriptedChecker {
    async fn check(&self, token: &Token) -> Result<bool, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((token.clone(), tokio::time::Instant::now()));
        let hangs = self.hanging.lock().unwrap().contains(token);
        if hangs {
            std::future::pending::<()>().await;
        }
        self.scripts
            .lock()
            .unwrap()
            .get_mut(token)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(false))
    }
}

/// Memory store that counts calls and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    creates: AtomicUsize,
    deletes: Mutex<Vec<(OwnerId, Token)>>,
    failing_deletes: AtomicU32,
    fail_creates: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requests(requests: Vec<TrackingRequest>) -> Self {
        Self {
            inner: MemoryStore::with_requests(requests),
            ..Self::default()
        }
    }

    /// The next `count` deletes fail.
    pub fn fail_deletes(&self, count: u32) {
        self.failing_deletes.store(count, Ordering::SeqCst);
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> Vec<(OwnerId, Token)> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<TrackingRequest> {
        self.inner.load_all().unwrap()
    }

    fn record_delete(&self, owner: OwnerId, token: &Token) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push((owner, token.clone()));
        let failing = self.failing_deletes.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_deletes.store(failing - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("database is down".to_string()));
        }
        Ok(())
    }
}

impl Store for RecordingStore {
    fn create(&self, request: &TrackingRequest) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("database is down".to_string()));
        }
        self.inner.create(request)
    }

    fn delete(&self, owner: OwnerId, token: &Token) -> Result<(), StoreError> {
        self.record_delete(owner, token)?;
        self.inner.delete(owner, token)
    }

    fn retire(&self, request: &TrackingRequest) -> Result<(), StoreError> {
        self.record_delete(request.owner, &request.token)?;
        self.inner.retire(request)
    }

    fn load_all(&self) -> Result<Vec<TrackingRequest>, StoreError> {
        self.inner.load_all()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notice: Notice) -> Result<(), NotifyError> {
        self.notices.lock().unwrap().push(notice);
        Ok(())
    }
}

pub struct Harness {
    pub checker: Arc<ScriptedChecker>,
    pub store: Arc<RecordingStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(checker: ScriptedChecker, store: RecordingStore) -> Self {
        Self {
            checker: Arc::new(checker),
            store: Arc::new(store),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    pub fn deps(&self, settings: WatchSettings) -> WatcherDeps {
        WatcherDeps {
            checker: self.checker.clone(),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            settings,
        }
    }
}

/// Polls `done` on virtual time, giving up after an hour of it.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..3600 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("condition not reached");
}

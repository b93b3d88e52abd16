//! Docwatch engine: page checks, persistence contract and watcher supervision.
mod checker;
mod fetch;
mod notify;
mod page;
mod persist;
mod router;
mod settings;
mod store;
mod supervisor;
mod types;
mod watcher;

pub use checker::{HttpPageChecker, PageChecker};
pub use fetch::{FetchSettings, FetchedPage, PageFetcher};
pub use notify::{ChannelNotifier, Notice, Notifier, NotifyError};
pub use page::{decode_page, CellScanner};
pub use persist::{ensure_parent_dir, AtomicFileWriter, PersistError};
pub use router::{CommandRouter, Inbound};
pub use settings::{system_clock, Clock, WatchSettings};
pub use store::{is_same_registration, MemoryStore, Store, StoreError};
pub use supervisor::{RecoveryReport, RequestSupervisor, ShutdownReport, TokenRule, WatchKey};
pub use types::{FailureKind, FetchError, TrackerError};
pub use watcher::{run_watcher, WatcherDeps, WatcherReport};

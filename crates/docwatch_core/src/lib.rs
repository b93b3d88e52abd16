//! Docwatch core: pure tracking-request types and the watcher state machine.
mod command;
mod effect;
mod elapsed;
mod msg;
mod reply;
mod state;
mod token;
mod update;
mod view_model;

pub use command::{classify, Command};
pub use effect::WatchEffect;
pub use elapsed::{format_elapsed, format_elapsed_secs};
pub use msg::{CheckOutcome, WatchMsg};
pub use reply::{
    already_tracking, documents_ready, help_text, invalid_token, not_tracking, polling_stopped,
    retire_failed, save_failed, stale_request, started_checking, GREETING, SHUTTING_DOWN,
    UNKNOWN_COMMAND,
};
pub use state::{RequestStatus, TrackingRequest, WatchPhase, WatchState};
pub use token::{parse_tracking_number, OwnerId, Token, TokenError};
pub use update::update;
pub use view_model::{render_watch_list, ActiveWatch};

use std::sync::Arc;
use std::time::Duration;

use docwatch_core::{
    already_tracking, classify, help_text, invalid_token, not_tracking, polling_stopped,
    render_watch_list, save_failed, stale_request, started_checking, ActiveWatch, Command,
    OwnerId, Token, TrackingRequest, GREETING, SHUTTING_DOWN, UNKNOWN_COMMAND,
};
use docwatch_logging::{watch_debug, watch_error, watch_warn};

use crate::{Notice, RequestSupervisor, TrackerError};

/// One chat message as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub owner: OwnerId,
    pub text: String,
}

impl Inbound {
    pub fn new(owner: OwnerId, text: impl Into<String>) -> Self {
        Self {
            owner,
            text: text.into(),
        }
    }
}

/// Turns chat input into supervisor calls and a reply for the sender.
pub struct CommandRouter {
    supervisor: Arc<RequestSupervisor>,
    page_url: String,
    poll_interval: Duration,
}

impl CommandRouter {
    pub fn new(supervisor: Arc<RequestSupervisor>, page_url: impl Into<String>) -> Self {
        let poll_interval = supervisor.deps().settings.poll_interval;
        Self {
            supervisor,
            page_url: page_url.into(),
            poll_interval,
        }
    }

    pub fn handle(&self, inbound: &Inbound) -> Notice {
        let owner = inbound.owner;
        let command = classify(&inbound.text);
        watch_debug!("{} sent {:?}", owner, command);

        let text = match command {
            Command::Start => GREETING.to_string(),
            Command::Help => help_text(&self.page_url, self.poll_interval),
            Command::List => render_watch_list(
                &self.overview(owner),
                self.supervisor.deps().settings.now(),
            ),
            Command::Stop { token: None } => {
                let mut tokens = self.supervisor.cancel_owner(owner);
                tokens.extend(self.unwatched(owner).into_iter().map(|r| r.token));
                tokens.sort();
                tokens.dedup();
                for token in &tokens {
                    self.forget(owner, token);
                }
                polling_stopped(&tokens)
            }
            Command::Stop { token: Some(raw) } => match Token::new(&raw) {
                Ok(token) => self.stop_one(owner, token),
                Err(_) => invalid_token(),
            },
            Command::Unknown(_) => UNKNOWN_COMMAND.to_string(),
            Command::Track(raw) => self.track(owner, &raw),
        };
        Notice::new(owner, text)
    }

    fn track(&self, owner: OwnerId, raw: &str) -> String {
        match self.supervisor.register(owner, raw) {
            Ok(token) => started_checking(&token),
            Err(TrackerError::InvalidToken(_)) => invalid_token(),
            Err(TrackerError::Duplicate { token, .. }) => {
                if self.supervisor.is_live(owner, &token) {
                    already_tracking(&token)
                } else {
                    stale_request(&token)
                }
            }
            Err(TrackerError::ShuttingDown) => SHUTTING_DOWN.to_string(),
            Err(err) => {
                watch_error!("error inserting tracking number for {}: {}", owner, err);
                save_failed()
            }
        }
    }

    /// Stops a live watch, or drops a stored request nobody is checking.
    fn stop_one(&self, owner: OwnerId, token: Token) -> String {
        let known = self.supervisor.cancel(owner, &token).is_ok()
            || self.unwatched(owner).iter().any(|r| r.token == token);
        if !known {
            return not_tracking(&token);
        }
        self.forget(owner, &token);
        polling_stopped(std::slice::from_ref(&token))
    }

    /// Live watches plus stored requests without a watcher, oldest first.
    fn overview(&self, owner: OwnerId) -> Vec<ActiveWatch> {
        let mut watches = self.supervisor.active(owner);
        watches.extend(self.unwatched(owner).into_iter().map(|request| ActiveWatch {
            token: request.token,
            created_at: request.created_at,
            checking: false,
        }));
        watches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.token.cmp(&b.token)));
        watches
    }

    /// Stored requests of `owner` with no live watcher, e.g. after a match
    /// the store refused to clear.
    fn unwatched(&self, owner: OwnerId) -> Vec<TrackingRequest> {
        match self.supervisor.stored(owner) {
            Ok(requests) => requests
                .into_iter()
                .filter(|request| !self.supervisor.is_live(owner, &request.token))
                .collect(),
            Err(err) => {
                watch_warn!("could not read stored requests of {}: {}", owner, err);
                Vec::new()
            }
        }
    }

    /// Drops a cancelled request from storage so a restart does not resume it.
    fn forget(&self, owner: OwnerId, token: &Token) {
        if let Err(err) = self.supervisor.forget(owner, token) {
            watch_warn!("could not forget {}/{}: {}", owner, token, err);
        }
    }
}

use std::collections::VecDeque;
use std::sync::Arc;

use docwatch_core::{
    update, CheckOutcome, OwnerId, Token, TrackingRequest, WatchEffect, WatchMsg, WatchPhase,
    WatchState,
};
use docwatch_logging::{watch_debug, watch_error, watch_info, watch_warn};
use tokio_util::sync::CancellationToken;

use crate::{Notice, Notifier, PageChecker, Store, WatchSettings};

/// Collaborators every watcher of a supervisor shares.
pub struct WatcherDeps {
    pub checker: Arc<dyn PageChecker>,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: WatchSettings,
}

/// Final state of a watcher task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherReport {
    pub owner: OwnerId,
    pub token: Token,
    /// `Done`, `Cancelled`, or `Matched` when the store never retired the request.
    pub phase: WatchPhase,
    pub checks: u32,
    pub failed_checks: u32,
}

/// Drives one request through the watch state machine until it stops.
///
/// Cancellation is observed before each fetch, right after it, while
/// sleeping between polls, and between delete attempts. A watcher only ever
/// removes its own registration from the store, never a newer one for the
/// same pair.
pub async fn run_watcher(
    request: TrackingRequest,
    deps: &WatcherDeps,
    cancel: CancellationToken,
) -> WatcherReport {
    let owner = request.owner;
    let token = request.token.clone();
    let mut state = WatchState::new(request, deps.settings.delete_attempts);
    let mut pending = VecDeque::from([WatchEffect::CheckPage {
        token: token.clone(),
    }]);
    watch_info!("watcher {}/{} started", owner, token);

    while let Some(effect) = pending.pop_front() {
        let msg = match effect {
            WatchEffect::CheckPage { token } => {
                if cancel.is_cancelled() {
                    WatchMsg::CancelRequested
                } else {
                    let result = deps.checker.check(&token).await;
                    if cancel.is_cancelled() {
                        WatchMsg::CancelRequested
                    } else {
                        match &result {
                            Ok(found) => {
                                watch_debug!("check {}/{}: found={}", owner, token, found)
                            }
                            Err(err) => watch_warn!("check {}/{} failed: {}", owner, token, err),
                        }
                        WatchMsg::CheckCompleted {
                            outcome: CheckOutcome::from_result(result),
                            at: deps.settings.now(),
                        }
                    }
                }
            }
            WatchEffect::WaitInterval => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => WatchMsg::CancelRequested,
                    _ = tokio::time::sleep(deps.settings.poll_interval) => WatchMsg::Tick,
                }
            }
            WatchEffect::DeleteToken { owner, token } => {
                if cancel.is_cancelled() {
                    WatchMsg::CancelRequested
                } else {
                    let result = deps.store.retire(state.request());
                    if let Err(err) = &result {
                        watch_error!("could not retire {}/{}: {}", owner, token, err);
                    }
                    WatchMsg::DeleteCompleted(result.map_err(|err| err.to_string()))
                }
            }
            WatchEffect::WaitRetry => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => WatchMsg::CancelRequested,
                    _ = tokio::time::sleep(deps.settings.delete_retry_backoff) => WatchMsg::Tick,
                }
            }
            WatchEffect::Deliver { owner, text } => {
                if let Err(err) = deps.notifier.deliver(Notice::new(owner, text)).await {
                    watch_error!("could not notify {} about {}: {}", owner, token, err);
                }
                continue;
            }
            WatchEffect::Stop => break,
        };

        let before = state.phase();
        let (next, effects) = update(state, msg);
        state = next;
        if state.phase() != before {
            watch_info!(
                "watcher {}/{}: {:?} -> {:?}",
                owner,
                token,
                before,
                state.phase()
            );
        }
        pending.extend(effects);
    }

    if state.is_stalled() {
        watch_error!(
            "watcher {}/{} matched after {} but the store refused {} deletes; request left pending",
            owner,
            token,
            state.elapsed().unwrap_or("?"),
            state.delete_attempts()
        );
    } else if state.phase() == WatchPhase::Done {
        watch_info!(
            "found tracking number {} for {}. Elapsed Time: {}",
            token,
            owner,
            state.elapsed().unwrap_or("?")
        );
    }

    WatcherReport {
        owner,
        token,
        phase: state.phase(),
        checks: state.checks(),
        failed_checks: state.failed_checks(),
    }
}

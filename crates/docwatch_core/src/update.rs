use crate::{
    documents_ready, format_elapsed, retire_failed, CheckOutcome, WatchEffect, WatchMsg,
    WatchPhase, WatchState,
};

/// Pure update function: applies a message to a watcher and returns the effects to run.
///
/// Messages that make no sense in the current phase (a late check result after
/// cancellation, a tick after completion) are ignored and produce no effects.
/// A cancel while the match is still being retired stops the watcher without
/// a notice; the stored request then belongs to whoever cancelled it.
pub fn update(mut state: WatchState, msg: WatchMsg) -> (WatchState, Vec<WatchEffect>) {
    let effects = match (state.phase(), msg) {
        (WatchPhase::Polling, WatchMsg::Tick) => vec![WatchEffect::CheckPage {
            token: state.request().token.clone(),
        }],
        (WatchPhase::Polling, WatchMsg::CheckCompleted { outcome, at }) => match outcome {
            CheckOutcome::Found => {
                state.record_check(true);
                let elapsed = at.signed_duration_since(state.request().created_at);
                state.set_elapsed(format_elapsed(elapsed));
                state.set_phase(WatchPhase::Matched);
                vec![delete_effect(&state)]
            }
            CheckOutcome::NotFound => {
                state.record_check(true);
                vec![WatchEffect::WaitInterval]
            }
            CheckOutcome::Unknown(_) => {
                state.record_check(false);
                vec![WatchEffect::WaitInterval]
            }
        },
        (WatchPhase::Polling | WatchPhase::Matched, WatchMsg::CancelRequested) => {
            state.set_phase(WatchPhase::Cancelled);
            vec![WatchEffect::Stop]
        }
        (WatchPhase::Matched, WatchMsg::Tick) if !state.is_stalled() => {
            vec![delete_effect(&state)]
        }
        (WatchPhase::Matched, WatchMsg::DeleteCompleted(Ok(()))) => {
            state.record_delete_attempt();
            state.set_phase(WatchPhase::Done);
            let text = documents_ready(state.elapsed().unwrap_or_default());
            vec![
                WatchEffect::Deliver {
                    owner: state.request().owner,
                    text,
                },
                WatchEffect::Stop,
            ]
        }
        (WatchPhase::Matched, WatchMsg::DeleteCompleted(Err(_))) => {
            if state.record_delete_attempt() {
                vec![WatchEffect::WaitRetry]
            } else {
                // Stays Matched: the request is still persisted and is checked
                // again after a restart, so the success message is withheld.
                let request = state.request();
                vec![
                    WatchEffect::Deliver {
                        owner: request.owner,
                        text: retire_failed(&request.token),
                    },
                    WatchEffect::Stop,
                ]
            }
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn delete_effect(state: &WatchState) -> WatchEffect {
    WatchEffect::DeleteToken {
        owner: state.request().owner,
        token: state.request().token.clone(),
    }
}

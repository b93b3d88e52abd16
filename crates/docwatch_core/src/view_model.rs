use chrono::{DateTime, Utc};

use crate::{format_elapsed, Token};

/// One of an owner's requests as shown by `/list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWatch {
    pub token: Token,
    pub created_at: DateTime<Utc>,
    /// False for a stored request that no watcher is checking any more.
    pub checking: bool,
}

pub fn render_watch_list(watches: &[ActiveWatch], now: DateTime<Utc>) -> String {
    if watches.is_empty() {
        return "You are not tracking anything".to_string();
    }
    let mut lines = Vec::with_capacity(watches.len() + 1);
    lines.push("Tracking:".to_string());
    for watch in watches {
        let line = if watch.checking {
            format!(
                "{} (waiting {})",
                watch.token,
                format_elapsed(now.signed_duration_since(watch.created_at))
            )
        } else {
            format!(
                "{} (not being checked, send /stop {} to remove)",
                watch.token, watch.token
            )
        };
        lines.push(line);
    }
    lines.join("\n")
}

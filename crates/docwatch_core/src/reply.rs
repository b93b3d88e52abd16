//! User-facing texts sent back through the chat transport.
use std::time::Duration;

use crate::{format_elapsed_secs, Token};

pub const GREETING: &str = "Send me tracking number";
pub const UNKNOWN_COMMAND: &str = "I don't know that command";
pub const SHUTTING_DOWN: &str = "The service is shutting down, try again later";

pub fn documents_ready(elapsed: &str) -> String {
    format!("Your documents are ready! Elapsed Time: {elapsed}")
}

pub fn retire_failed(token: &Token) -> String {
    format!(
        "Tracking number {token} has appeared on the page, but it could not be marked as done. \
         It will be checked again after the next restart, or send /stop {token} to drop it"
    )
}

pub fn started_checking(token: &Token) -> String {
    format!("Started checking the webpage for {token}, wait for notification")
}

pub fn already_tracking(token: &Token) -> String {
    format!("You are already tracking {token}")
}

pub fn stale_request(token: &Token) -> String {
    format!("{token} is saved but no longer being checked, send /stop {token} to remove it")
}

pub fn invalid_token() -> String {
    "Doesn't look like a valid tracking number, try again".to_string()
}

pub fn save_failed() -> String {
    "Failed to save your tracking number, try again later".to_string()
}

pub fn polling_stopped(tokens: &[Token]) -> String {
    match tokens {
        [] => "Nothing to stop, you are not tracking anything".to_string(),
        [single] => format!("Polling stopped for {single}"),
        many => {
            let list = many
                .iter()
                .map(Token::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            format!("Polling stopped for {list}")
        }
    }
}

pub fn not_tracking(token: &Token) -> String {
    format!("You are not tracking {token}")
}

pub fn help_text(page_url: &str, poll_interval: Duration) -> String {
    format!(
        "This bot fetches the content of {page_url} every {}. \
         Send a tracking number to start, /list to see your numbers, /stop to stop",
        describe_interval(poll_interval)
    )
}

fn describe_interval(interval: Duration) -> String {
    match interval.as_secs() {
        60 => "minute".to_string(),
        secs if secs < 60 => format!("{secs} seconds"),
        secs => format_elapsed_secs(secs),
    }
}

//! Line-based stand-in for a chat network: `<owner-id> <text>` in,
//! `[owner <id>] <text>` out.

use docwatch_core::OwnerId;
use docwatch_engine::{Inbound, Notice};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("empty line")]
    Blank,
    #[error("expected `<owner-id> <text>`, owner id {0:?} is not a number")]
    BadOwner(String),
    #[error("no message after owner id")]
    MissingText,
}

pub fn parse_line(line: &str) -> Result<Inbound, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LineError::Blank);
    }
    let (owner, text) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let owner = owner
        .parse::<i64>()
        .map_err(|_| LineError::BadOwner(owner.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(LineError::MissingText);
    }
    Ok(Inbound::new(OwnerId(owner), text))
}

pub fn render_notice(notice: &Notice) -> String {
    format!("[owner {}] {}", notice.owner, notice.text)
}

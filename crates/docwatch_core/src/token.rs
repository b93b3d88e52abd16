use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Stable identity of the user who registered a request (a chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("tracking number is empty")]
    Empty,
    #[error("tracking number contains letters: {0}")]
    ContainsLetters(String),
}

/// The string searched for on the watched page.
///
/// Stored trimmed; equality, hashing and matching ignore case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token {
    text: String,
    key: String,
}

impl Token {
    pub fn new(raw: &str) -> Result<Self, TokenError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(TokenError::Empty);
        }
        Ok(Self {
            text: text.to_string(),
            key: text.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when `candidate`, once trimmed, equals this token ignoring case.
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.trim().to_lowercase() == self.key
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for Token {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Token::new(&value)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.text
    }
}

/// Validates raw chat input as a tracking number.
///
/// Tracking numbers issued by the watched office are digits with separators,
/// so anything containing a letter is rejected.
pub fn parse_tracking_number(raw: &str) -> Result<Token, TokenError> {
    let token = Token::new(raw)?;
    if token.as_str().chars().any(char::is_alphabetic) {
        return Err(TokenError::ContainsLetters(token.text));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::{parse_tracking_number, Token, TokenError};

    #[test]
    fn token_is_trimmed_and_case_insensitive() {
        let a = Token::new("  AB-12 \n").unwrap();
        let b = Token::new("ab-12").unwrap();
        assert_eq!(a.as_str(), "AB-12");
        assert_eq!(a, b);
        assert!(a.matches("\tab-12  "));
        assert!(!a.matches("ab-123"));
    }

    #[test]
    fn empty_token_is_rejected() {
        assert_eq!(Token::new("   ").unwrap_err(), TokenError::Empty);
    }

    #[test]
    fn tracking_numbers_reject_letters() {
        assert!(parse_tracking_number("123456").is_ok());
        assert!(parse_tracking_number("12/3456-7").is_ok());
        assert_eq!(
            parse_tracking_number("12a34").unwrap_err(),
            TokenError::ContainsLetters("12a34".to_string())
        );
        assert!(parse_tracking_number("номер 5").is_err());
    }
}

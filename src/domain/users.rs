//! Username rules for identities handed over by the auth layer.

use thiserror::Error;

/// Upper bound matching the upstream identity provider's username field.
pub const MAX_USERNAME_CHARS: usize = 150;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username must not be empty")]
    Empty,
    #[error("username exceeds {limit} characters")]
    TooLong { limit: usize },
    #[error("username contains forbidden character `{ch}`")]
    ForbiddenChar { ch: char },
}

/// Validate a username: letters, digits and `@`, `.`, `+`, `-`, `_`,
/// at most [`MAX_USERNAME_CHARS`] characters.
pub fn validate_username(username: &str) -> Result<(), UsernameError> {
    if username.is_empty() {
        return Err(UsernameError::Empty);
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(UsernameError::TooLong {
            limit: MAX_USERNAME_CHARS,
        });
    }
    if let Some(ch) = username
        .chars()
        .find(|ch| !ch.is_alphanumeric() && !matches!(ch, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(UsernameError::ForbiddenChar { ch });
    }
    Ok(())
}

//! Validation rules and display helpers for post and comment text.

use thiserror::Error;

/// Characters kept when a post is reduced to its short preview form, as
/// shown in logs and compact listings.
pub const PREVIEW_CHARS: usize = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Reject text that is empty or whitespace only. The trimmed form decides;
/// interior whitespace is preserved as submitted.
pub fn validate_text(text: &str, field: &'static str) -> Result<(), TextError> {
    if text.trim().is_empty() {
        return Err(TextError::Empty { field });
    }
    Ok(())
}

/// First [`PREVIEW_CHARS`] characters of the text.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_text_with_content() {
        assert_eq!(validate_text("hello", "text"), Ok(()));
        assert_eq!(validate_text("  padded  ", "text"), Ok(()));
    }

    #[test]
    fn rejects_empty_and_whitespace_text() {
        assert_eq!(
            validate_text("", "text"),
            Err(TextError::Empty { field: "text" })
        );
        assert_eq!(
            validate_text(" \t\n ", "comment"),
            Err(TextError::Empty { field: "comment" })
        );
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("a very long post body goes here"), "a very long pos");
    }

    #[test]
    fn preview_keeps_short_text_whole() {
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let text = "строка из кириллицы";
        assert_eq!(preview(text), text.chars().take(15).collect::<String>());
        assert_eq!(preview(text).chars().count(), 15);
    }
}

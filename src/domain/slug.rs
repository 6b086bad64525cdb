//! Deterministic, URL-safe slugs for groups.
//!
//! Slugs are derived with the `slug` crate. Uniqueness lives behind a
//! caller-supplied predicate, so derivation stays pure while the storage
//! layer decides which candidates are taken.

use std::future::Future;

use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

/// Ways slug derivation can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("cannot build a slug from empty text")]
    EmptyInput,
    #[error("no slug characters remain in `{input}`")]
    Unrepresentable { input: String },
    #[error("no unique slug variant available for `{base}`")]
    Exhausted { base: String },
}

/// Errors from slug generation backed by an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E: std::error::Error + Send + Sync + 'static> {
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Turn human-readable title text into a base slug.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    match slugify(input) {
        candidate if candidate.is_empty() => Err(SlugError::Unrepresentable {
            input: input.to_string(),
        }),
        candidate => Ok(candidate),
    }
}

/// Whether a client-supplied slug is already in canonical form: lowercase
/// ASCII letters, digits and interior hyphens.
pub fn is_well_formed(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && !candidate.contains("--")
        && candidate
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

/// Find a slug the supplied predicate reports as free.
///
/// `is_unique` must resolve to `Ok(true)` when the candidate is free. The
/// base slug is tried first, then counter-suffixed variants (`-2`, `-3`, …)
/// up to a fixed attempt ceiling.
pub async fn generate_unique_slug<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    let mut candidate = base.clone();
    for attempt in 1..=MAX_SUFFIX_ATTEMPTS + 1 {
        if attempt > 1 {
            candidate = format!("{base}-{attempt}");
        }
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

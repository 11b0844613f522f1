//! Project name validation
//!
//! Project names become namespace names on the cluster and must be valid
//! DNS labels. Invalid names are never corrected silently: callers get a
//! suggestion back and resubmit.

use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a DNS label
pub const MAX_PROJECT_NAME_LENGTH: usize = 63;

static PROJECT_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap()
});

static LEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^A-Za-z0-9]+").unwrap()
});

static TRAILING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9]+$").unwrap()
});

static DISALLOWED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9-]+").unwrap()
});

/// Whether `name` can be used as-is for a project
pub fn is_valid_project_name(name: &str) -> bool {
    name.len() <= MAX_PROJECT_NAME_LENGTH && PROJECT_NAME_REGEX.is_match(name)
}

/// Normalize a candidate into a name the cluster accepts.
///
/// Returns an empty string when the candidate has no ASCII alphanumerics.
pub fn suggest_project_name(candidate: &str) -> String {
    let trimmed = LEADING_REGEX.replace(candidate, "");
    let trimmed = TRAILING_REGEX.replace(&trimmed, "");
    let mut suggested = DISALLOWED_REGEX
        .replace_all(&trimmed, "-")
        .to_ascii_lowercase();

    if suggested.len() > MAX_PROJECT_NAME_LENGTH {
        suggested.truncate(MAX_PROJECT_NAME_LENGTH);
        let end = suggested.trim_end_matches('-').len();
        suggested.truncate(end);
    }

    suggested
}

/// Reject any name that differs from its normalized form
pub fn validate_project_name(name: &str) -> Result<()> {
    let suggestion = suggest_project_name(name);
    if suggestion == name && is_valid_project_name(name) {
        return Ok(());
    }

    Err(Error::InvalidProjectName {
        name: name.to_string(),
        suggestion: if suggestion.is_empty() {
            None
        } else {
            Some(suggestion)
        },
    })
}

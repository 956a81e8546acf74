//! Validation helpers for names and version strings

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use validator::ValidationError;

/// Version strings are timestamps in this layout
pub const VERSION_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Image and domain name validation regex (compiled once)
///
/// ASCII alphanumerics plus `-`, `_` and `.`, starting with an
/// alphanumeric, at most 128 characters.
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("name regex is valid")
});

/// Shape check before the calendar check, so `2025-1-1-0-0-0` is rejected
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}$").expect("version regex is valid")
});

/// Validate an image or domain name
pub fn is_valid_name(name: &str) -> bool {
    NAME_REGEX.is_match(name)
}

/// Validate a `YYYY-MM-DD-hh-mm-ss` version string, including the calendar date
pub fn is_valid_version(version: &str) -> bool {
    VERSION_REGEX.is_match(version)
        && NaiveDateTime::parse_from_str(version, VERSION_FORMAT).is_ok()
}

/// `validator` hook for name fields
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if is_valid_name(name) {
        return Ok(());
    }
    Err(ValidationError::new("name")
        .with_message(Cow::Borrowed("must be alphanumeric with '-', '_' or '.'")))
}

/// `validator` hook for version fields
pub fn validate_version(version: &str) -> Result<(), ValidationError> {
    if is_valid_version(version) {
        return Ok(());
    }
    Err(ValidationError::new("version")
        .with_message(Cow::Borrowed("must be formatted YYYY-MM-DD-hh-mm-ss")))
}

/// `validator` hook for domain version fields.
///
/// Domain versions are free-form labels with the same charset as names.
pub fn validate_domain_version(version: &str) -> Result<(), ValidationError> {
    if is_valid_name(version) {
        return Ok(());
    }
    Err(ValidationError::new("version")
        .with_message(Cow::Borrowed("must be alphanumeric with '-', '_' or '.'")))
}

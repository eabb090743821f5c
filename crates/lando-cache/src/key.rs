//! Cache key validation
//!
//! Persisted entries are stored as `<dir>/<key>`, so a key has to be a safe
//! single file name on every platform. Keys are validated rather than
//! silently rewritten: two different ids must never map to the same file.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

/// Characters no file name may contain on Windows, plus the separators.
const ILLEGAL_CHARS: &[char] = &['/', '\\', '?', '<', '>', ':', '*', '|', '"'];

const MAX_KEY_LENGTH: usize = 255;

/// Windows device names, with or without an extension.
static RESERVED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$")
        .expect("Invalid reserved name regex")
});

/// Validate that `key` can be used verbatim as a cache file name.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key must not be empty"));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(invalid("key is longer than 255 bytes"));
    }
    if key.chars().any(char::is_control) {
        return Err(invalid("key contains control characters"));
    }
    if let Some(c) = key.chars().find(|c| ILLEGAL_CHARS.contains(c)) {
        return Err(invalid(&format!("key contains illegal character '{c}'")));
    }
    if key == "." || key == ".." {
        return Err(invalid("key is a relative path"));
    }
    if key.ends_with('.') || key.ends_with(' ') {
        return Err(invalid("key must not end with a dot or space"));
    }
    if RESERVED_NAME.is_match(key) {
        return Err(invalid("key is a reserved device name"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("lando.plugins")]
    #[case("lando-registry")]
    #[case("@lando_core")]
    #[case("console")]
    #[case("com10")]
    fn accepts_safe_keys(#[case] key: &str) {
        assert!(validate_key(key).is_ok(), "{key} should be valid");
    }

    #[rstest]
    #[case("")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case("what?")]
    #[case("tab\there")]
    #[case(".")]
    #[case("..")]
    #[case("trailing.")]
    #[case("trailing ")]
    #[case("con")]
    #[case("CON")]
    #[case("nul.json")]
    #[case("lpt1")]
    fn rejects_unsafe_keys(#[case] key: &str) {
        assert!(
            matches!(validate_key(key), Err(Error::InvalidKey { .. })),
            "{key:?} should be rejected"
        );
    }

    #[test]
    fn rejects_overlong_keys() {
        assert!(validate_key(&"k".repeat(256)).is_err());
        assert!(validate_key(&"k".repeat(255)).is_ok());
    }
}

//! Key and workspace-name validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated, trimmed, non-empty entry key.
///
/// Construction is the only place emptiness is checked; once a `Key`
/// exists it is guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    /// Validate and construct a `Key` from caller input.
    ///
    /// Trims surrounding whitespace; rejects empty or all-whitespace
    /// strings.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::empty_key());
        }
        Ok(Key(trimmed.to_string()))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a dotted path into its first segment (the storage key) and
    /// the remaining sub-path, if any.
    pub fn split_subpath(raw: &str) -> (&str, Option<&str>) {
        match raw.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (raw, None),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a workspace identifier: alphanumeric plus `_`/`-`, non-empty.
pub fn validate_workspace_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("workspace name cannot be empty".to_string()));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(Error::Validation(format!(
            "workspace name {name:?} must be alphanumeric plus '_'/'-'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_blank_keys() {
        assert!(Key::new("").is_err());
        assert!(Key::new("   ").is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let k = Key::new("  hello  ").unwrap();
        assert_eq!(k.as_str(), "hello");
    }

    #[test]
    fn splits_dotted_subpath() {
        assert_eq!(Key::split_subpath("user.name"), ("user", Some("name")));
        assert_eq!(Key::split_subpath("user.address.city"), ("user", Some("address.city")));
        assert_eq!(Key::split_subpath("user"), ("user", None));
    }

    #[test]
    fn validates_workspace_names() {
        assert!(validate_workspace_name("default").is_ok());
        assert!(validate_workspace_name("work-space_1").is_ok());
        assert!(validate_workspace_name("").is_err());
        assert!(validate_workspace_name("bad name").is_err());
        assert!(validate_workspace_name("bad/name").is_err());
    }
}

//! Config field paths used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path of a config field, e.g. `freeze.url_prefix`.
///
/// ```ignore
/// const URL_PREFIX: FieldPath = FieldPath::new("freeze.url_prefix");
/// diag.error(URL_PREFIX, "required when `url_suffixes` is set");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path() {
        const DIRS: FieldPath = FieldPath::new("freeze.dirs");
        assert_eq!(DIRS.as_str(), "freeze.dirs");
        assert_eq!(DIRS.as_ref(), "freeze.dirs");
    }
}

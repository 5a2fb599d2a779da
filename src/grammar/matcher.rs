//! Built-in token matchers.
//!
//! A matcher looks at the scan position of a [`Cursor`] and either claims a
//! non-empty run of text or declines. The grammar tries its rules in order
//! and the first claim wins.

use std::sync::Arc;

use super::Match;

/// Scan position inside the source.
///
/// `behind` is everything already consumed, `ahead` everything remaining
/// (including the character at the position).
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, position: usize) -> Self {
        debug_assert!(source.is_char_boundary(position));
        Self { source, position }
    }

    /// Byte offset of the scan position.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn behind(&self) -> &'a str {
        &self.source[..self.position]
    }

    #[inline]
    pub fn ahead(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// Character at the scan position.
    #[inline]
    pub fn symbol(&self) -> Option<char> {
        self.ahead().chars().next()
    }

    /// Claim `len` bytes starting at the scan position.
    pub fn take(&self, len: usize) -> Option<Match> {
        if len == 0 {
            return None;
        }
        let text = self.ahead().get(..len)?;
        Some(Match::new(text, self.position, self.position + len))
    }
}

/// Token matcher: claims text at a cursor or declines with `None`.
pub type Matcher = Arc<dyn Fn(&Cursor<'_>) -> Option<Match> + Send + Sync>;

/// Any single character.
pub fn any() -> Matcher {
    Arc::new(|cursor| cursor.symbol().and_then(|c| cursor.take(c.len_utf8())))
}

/// Exact literal, e.g. a block comment delimiter.
pub fn literal(text: impl Into<String>) -> Matcher {
    let text = text.into();
    Arc::new(move |cursor| {
        if !text.is_empty() && cursor.ahead().starts_with(text.as_str()) {
            cursor.take(text.len())
        } else {
            None
        }
    })
}

/// Run of whitespace, newlines excluded.
pub fn whitespace() -> Matcher {
    Arc::new(|cursor| {
        let ahead = cursor.ahead();
        let len = ahead
            .char_indices()
            .find(|&(_, c)| !c.is_whitespace() || c == '\n')
            .map_or(ahead.len(), |(i, _)| i);
        cursor.take(len)
    })
}

/// A single `\n`.
pub fn linebreak() -> Matcher {
    Arc::new(|cursor| match cursor.symbol() {
        Some('\n') => cursor.take(1),
        _ => None,
    })
}

/// From `prefix` up to, not including, the next newline.
pub fn line_comment(prefix: impl Into<String>) -> Matcher {
    let prefix = prefix.into();
    Arc::new(move |cursor| {
        let ahead = cursor.ahead();
        if prefix.is_empty() || !ahead.starts_with(prefix.as_str()) {
            return None;
        }
        cursor.take(ahead.find('\n').unwrap_or(ahead.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_windows() {
        let cursor = Cursor::new("foobar", 3);
        assert_eq!(cursor.behind(), "foo");
        assert_eq!(cursor.ahead(), "bar");
        assert_eq!(cursor.symbol(), Some('b'));
    }

    #[test]
    fn test_literal() {
        let m = literal("foo")(&Cursor::new("foo", 0)).unwrap();
        assert_eq!(m, Match::new("foo", 0, 3));

        assert!(literal("foo")(&Cursor::new("fo", 0)).is_none());
        assert!(literal("foo")(&Cursor::new("xfoo", 0)).is_none());
        assert!(literal("")(&Cursor::new("foo", 0)).is_none());
    }

    #[test]
    fn test_any() {
        let m = any()(&Cursor::new("foo", 1)).unwrap();
        assert_eq!(m, Match::new("o", 1, 2));

        // Multi-byte characters are consumed whole
        let m = any()(&Cursor::new("aé", 1)).unwrap();
        assert_eq!(m, Match::new("é", 1, 3));

        assert!(any()(&Cursor::new("foo", 3)).is_none());
    }

    #[test]
    fn test_whitespace() {
        let m = whitespace()(&Cursor::new("    foo", 0)).unwrap();
        assert_eq!(m, Match::new("    ", 0, 4));

        let m = whitespace()(&Cursor::new("x \t\ny", 1)).unwrap();
        assert_eq!(m, Match::new(" \t", 1, 3));

        assert!(whitespace()(&Cursor::new("\n  ", 0)).is_none());
        assert!(whitespace()(&Cursor::new("foo", 0)).is_none());
    }

    #[test]
    fn test_linebreak() {
        assert_eq!(
            linebreak()(&Cursor::new("a\nb", 1)),
            Some(Match::new("\n", 1, 2))
        );
        assert!(linebreak()(&Cursor::new("a\nb", 0)).is_none());
    }

    #[test]
    fn test_line_comment() {
        let m = line_comment("//")(&Cursor::new("x // note\ny", 2)).unwrap();
        assert_eq!(m, Match::new("// note", 2, 9));

        let m = line_comment("#")(&Cursor::new("# tail", 0)).unwrap();
        assert_eq!(m.text, "# tail");

        assert!(line_comment("//")(&Cursor::new("/ /", 0)).is_none());
    }
}

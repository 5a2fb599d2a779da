//! Tokenizer producing a nested token tree.
//!
//! The grammar only knows flat tokens plus one balanced construct: block
//! comments. A comment start opens a container whose children are the
//! tokens up to its antipode; the antipode itself follows the container as
//! its next sibling.
//!
//! ```text
//! "foo<!-- comment -->bar"
//!
//! Raw("foo")
//! BlockCommentStart("<!--")
//! └── Raw(" comment ")
//! BlockCommentEnd("-->")
//! Raw("bar")
//! ```
//!
//! Containers nest: a start met inside an open container descends one level
//! instead of closing the outer one. Input that ends before the antipode is
//! not an error, the container just runs to the end of the file.

pub mod ast;
pub mod matcher;

use std::fmt;

use thiserror::Error;

pub use matcher::{Cursor, Matcher};

// ============================================================================
// Tokens
// ============================================================================

/// Token kinds understood by the base grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Raw,
    BlockCommentStart,
    BlockCommentEnd,
    LineComment,
    Whitespace,
    Newline,
}

impl TokenKind {
    /// Kinds that open a nested region.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::BlockCommentStart)
    }

    /// Kinds reproduced verbatim, never offered to reference matchers.
    #[inline]
    pub const fn is_opaque(self) -> bool {
        matches!(
            self,
            Self::BlockCommentStart | Self::BlockCommentEnd | Self::LineComment
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::BlockCommentStart => "block-comment-start",
            Self::BlockCommentEnd => "block-comment-end",
            Self::LineComment => "line-comment",
            Self::Whitespace => "whitespace",
            Self::Newline => "newline",
        };
        f.write_str(name)
    }
}

/// Fixed container pairs, `(open, close)`.
const ANTIPODES: &[(TokenKind, TokenKind)] =
    &[(TokenKind::BlockCommentStart, TokenKind::BlockCommentEnd)];

/// The kind balancing `kind` in a container pair (works in both directions).
pub fn antipode_of(kind: TokenKind) -> Result<TokenKind, GrammarError> {
    ANTIPODES
        .iter()
        .find_map(|&(open, close)| match kind {
            k if k == open => Some(close),
            k if k == close => Some(open),
            _ => None,
        })
        .ok_or(GrammarError::NoAntipode(kind))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("no known antipode for token `{0}`")]
    NoAntipode(TokenKind),
}

// ============================================================================
// Match / Node
// ============================================================================

/// Text claimed by a matcher, with byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Match {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// AST node. Only container starts carry children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: TokenKind,
    pub data: Match,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: TokenKind, data: Match, children: Vec<Node>) -> Self {
        Self {
            kind,
            data,
            children,
        }
    }

    pub fn leaf(kind: TokenKind, data: Match) -> Self {
        Self::new(kind, data, Vec::new())
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.data.text
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

pub type Ast = Vec<Node>;

// ============================================================================
// Grammar
// ============================================================================

/// Ordered `(kind, matcher)` rules; the first rule that claims text wins.
#[derive(Clone)]
pub struct Grammar {
    rules: Vec<(TokenKind, Matcher)>,
}

impl Default for Grammar {
    /// Every character becomes its own raw token.
    fn default() -> Self {
        Self::new(vec![(TokenKind::Raw, matcher::any())])
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field(
                "rules",
                &self.rules.iter().map(|(kind, _)| kind).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Outcome of scanning one container level.
struct Level {
    nodes: Ast,
    position: usize,
    antipode: Option<Node>,
}

impl Grammar {
    pub fn new(rules: Vec<(TokenKind, Matcher)>) -> Self {
        Self { rules }
    }

    /// Grammar for source files: optional comment syntax, then newlines,
    /// whitespace runs and raw characters.
    pub fn with_comments(block: Option<(&str, &str)>, line: Option<&str>) -> Self {
        let mut rules = Vec::with_capacity(6);
        if let Some((start, end)) = block {
            rules.push((TokenKind::BlockCommentStart, matcher::literal(start)));
            rules.push((TokenKind::BlockCommentEnd, matcher::literal(end)));
        }
        if let Some(prefix) = line.filter(|p| !p.is_empty()) {
            rules.push((TokenKind::LineComment, matcher::line_comment(prefix)));
        }
        rules.push((TokenKind::Newline, matcher::linebreak()));
        rules.push((TokenKind::Whitespace, matcher::whitespace()));
        rules.push((TokenKind::Raw, matcher::any()));
        Self::new(rules)
    }

    /// Tokenize `content` into a nested AST.
    pub fn parse(&self, content: &str) -> Result<Ast, GrammarError> {
        Ok(self.scan(content, 0, None)?.nodes)
    }

    /// First rule claiming text at `position`, falling back to one raw char.
    fn match_at(&self, content: &str, position: usize) -> (TokenKind, Match) {
        let cursor = Cursor::new(content, position);
        self.rules
            .iter()
            .find_map(|(kind, matcher)| {
                matcher(&cursor)
                    .filter(|m| !m.is_empty())
                    .map(|m| (*kind, m))
            })
            .unwrap_or_else(|| {
                let len = cursor.symbol().map_or(1, char::len_utf8);
                let m = cursor
                    .take(len)
                    .unwrap_or_else(|| Match::new("", position, position + len));
                (TokenKind::Raw, m)
            })
    }

    /// Scan from `position` until end of input or the antipode of `parent`.
    fn scan(
        &self,
        content: &str,
        mut position: usize,
        parent: Option<TokenKind>,
    ) -> Result<Level, GrammarError> {
        let closing = parent.map(antipode_of).transpose()?;
        let mut nodes = Vec::new();

        while position < content.len() {
            let (kind, data) = self.match_at(content, position);
            position = data.end;
            let mut node = Node::leaf(kind, data);

            if closing == Some(kind) {
                return Ok(Level {
                    nodes,
                    position,
                    antipode: Some(node),
                });
            }

            if kind.is_container() {
                let level = self.scan(content, position, Some(kind))?;
                position = level.position;
                node.children = level.nodes;
                nodes.push(node);
                nodes.extend(level.antipode);
            } else {
                nodes.push(node);
            }
        }

        Ok(Level {
            nodes,
            position,
            antipode: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, start: usize) -> Node {
        Node::leaf(TokenKind::Raw, Match::new(text, start, start + text.len()))
    }

    fn container_grammar(start: &str, end: &str) -> Grammar {
        Grammar::new(vec![
            (TokenKind::BlockCommentStart, matcher::literal(start)),
            (TokenKind::BlockCommentEnd, matcher::literal(end)),
            (TokenKind::Raw, matcher::any()),
        ])
    }

    #[test]
    fn test_antipode_of() {
        assert_eq!(
            antipode_of(TokenKind::BlockCommentStart),
            Ok(TokenKind::BlockCommentEnd)
        );
        assert_eq!(
            antipode_of(TokenKind::BlockCommentEnd),
            Ok(TokenKind::BlockCommentStart)
        );
        assert_eq!(
            antipode_of(TokenKind::Raw),
            Err(GrammarError::NoAntipode(TokenKind::Raw))
        );
    }

    #[test]
    fn test_default_grammar_splits_chars() {
        let ast = Grammar::default().parse("123").unwrap();
        assert_eq!(ast, vec![raw("1", 0), raw("2", 1), raw("3", 2)]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(Grammar::default().parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_container() {
        let grammar = container_grammar("<!--", "-->");
        let ast = ast::fold(
            grammar.parse("foo<!-- comment -->bar").unwrap(),
            ast::same_siblings,
        );

        assert_eq!(
            ast,
            vec![
                raw("foo", 0),
                Node::new(
                    TokenKind::BlockCommentStart,
                    Match::new("<!--", 3, 7),
                    vec![raw(" comment ", 7)],
                ),
                Node::leaf(TokenKind::BlockCommentEnd, Match::new("-->", 16, 19)),
                raw("bar", 19),
            ]
        );
    }

    #[test]
    fn test_parse_nested_containers() {
        let grammar = container_grammar("<xxx>", "</xxx>");
        let ast = ast::fold(
            grammar.parse("foo<xxx>in<xxx>n</xxx>er</xxx>bar").unwrap(),
            ast::same_siblings,
        );

        assert_eq!(ast.len(), 4);
        assert_eq!(ast[0], raw("foo", 0));
        assert_eq!(ast[2].data, Match::new("</xxx>", 24, 30));
        assert_eq!(ast[3], raw("bar", 30));

        let outer = &ast[1];
        assert_eq!(outer.kind, TokenKind::BlockCommentStart);
        assert_eq!(
            outer.children,
            vec![
                raw("in", 8),
                Node::new(
                    TokenKind::BlockCommentStart,
                    Match::new("<xxx>", 10, 15),
                    vec![raw("n", 15)],
                ),
                Node::leaf(TokenKind::BlockCommentEnd, Match::new("</xxx>", 16, 22)),
                raw("er", 22),
            ]
        );
    }

    #[test]
    fn test_unterminated_container_runs_to_eof() {
        let grammar = container_grammar("<!--", "-->");
        let ast = ast::fold(grammar.parse("a<!--b c").unwrap(), ast::same_siblings);

        assert_eq!(ast.len(), 2);
        assert_eq!(ast[1].kind, TokenKind::BlockCommentStart);
        assert_eq!(ast[1].children, vec![raw("b c", 5)]);
    }

    #[test]
    fn test_stray_antipode_is_a_leaf() {
        let grammar = container_grammar("<!--", "-->");
        let ast = grammar.parse("a-->b").unwrap();
        assert_eq!(ast[1].kind, TokenKind::BlockCommentEnd);
        assert!(ast[1].is_leaf());
    }

    #[test]
    fn test_parse_with_whitespace_and_newlines() {
        let grammar = Grammar::with_comments(Some(("<!--", "-->")), None);
        let ast = ast::fold(
            grammar.parse("foo\n<!-- comment -->\nbar baz").unwrap(),
            ast::same_siblings,
        );

        let kinds: Vec<_> = ast.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Raw,
                TokenKind::Newline,
                TokenKind::BlockCommentStart,
                TokenKind::BlockCommentEnd,
                TokenKind::Newline,
                TokenKind::Raw,
                TokenKind::Whitespace,
                TokenKind::Raw,
            ]
        );

        let comment = &ast[2];
        let inner: Vec<_> = comment.children.iter().map(|n| (n.kind, n.text())).collect();
        assert_eq!(
            inner,
            vec![
                (TokenKind::Whitespace, " "),
                (TokenKind::Raw, "comment"),
                (TokenKind::Whitespace, " "),
            ]
        );
    }

    #[test]
    fn test_line_comment_rule() {
        let grammar = Grammar::with_comments(None, Some("//"));
        let ast = grammar.parse("a // b\nc").unwrap();
        let comment = ast
            .iter()
            .find(|n| n.kind == TokenKind::LineComment)
            .unwrap();
        assert_eq!(comment.data, Match::new("// b", 2, 6));
    }

    #[test]
    fn test_unicode_offsets() {
        let ast = ast::fold(Grammar::default().parse("héllo").unwrap(), ast::same_siblings);
        assert_eq!(ast, vec![raw("héllo", 0)]);
        assert_eq!(ast[0].data.end, "héllo".len());
    }
}

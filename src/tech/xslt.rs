//! XSLT stylesheets: `xsl:import`/`xsl:include` and entity files are built
//! recursively, static assets are frozen as they are.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::Technology;
use crate::freeze::Result;
use crate::freeze::path::dir_of;
use crate::grammar::Node;

static RE_RECURSOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+\.(?:xsl|ent))["']"#).unwrap());
static RE_FREEZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+\.(?:css|js|png|jpe?g|gif))["']"#).unwrap());

/// Block comment delimiters for XML markup.
pub const COMMENTS: (&str, &str) = ("<!--", "-->");

#[derive(Debug, Clone)]
pub struct XsltTech {
    /// Project root; static asset paths resolve from here.
    root: PathBuf,
    recursor: Regex,
    freeze: Regex,
}

impl XsltTech {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursor: RE_RECURSOR.clone(),
            freeze: RE_FREEZE.clone(),
        }
    }

    /// Replace the reference patterns. Group 1 of each is the reference.
    pub fn with_patterns(mut self, recursor: Regex, freeze: Regex) -> Self {
        self.recursor = recursor;
        self.freeze = freeze;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn captures(regex: &Regex, text: &str) -> Vec<String> {
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Protocol-relative and absolute URLs point outside the project.
fn is_external(reference: &str) -> bool {
    reference.starts_with("//") || reference.starts_with("http://") || reference.starts_with("https://")
}

impl Technology for XsltTech {
    fn name(&self) -> &str {
        "freeze-from-xslt"
    }

    fn match_recursor(&self, node: &Node) -> Result<Option<Vec<String>>> {
        let found = captures(&self.recursor, node.text());
        Ok((!found.is_empty()).then_some(found))
    }

    fn match_freeze(&self, node: &Node) -> Result<Option<Vec<String>>> {
        let found: Vec<_> = captures(&self.freeze, node.text())
            .into_iter()
            .filter(|reference| !is_external(reference))
            .collect();
        Ok((!found.is_empty()).then_some(found))
    }

    /// Stylesheet and entity imports are relative to the importing file;
    /// everything else is relative to the project root.
    fn paths_base(&self, carrier: &Path, tail: &str) -> PathBuf {
        if tail.ends_with("xsl") || tail.ends_with("ent") {
            dir_of(carrier)
        } else {
            self.root.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Match, TokenKind};

    fn raw(text: &str) -> Node {
        Node::leaf(TokenKind::Raw, Match::new(text, 0, text.len()))
    }

    #[test]
    fn test_paths_base() {
        let tech = XsltTech::new("/");
        assert_eq!(
            tech.paths_base(Path::new("/foo/bar/baz.xsl"), "a.xsl"),
            PathBuf::from("/foo/bar")
        );
        assert_eq!(
            tech.paths_base(Path::new("/foo/bar/baz.xsl"), "a.ent"),
            PathBuf::from("/foo/bar")
        );
        assert_eq!(
            tech.paths_base(Path::new("/foo/bar/baz.xsl"), "a.css"),
            PathBuf::from("/")
        );
    }

    #[test]
    fn test_match_recursor() {
        let tech = XsltTech::new("/");
        let found = tech
            .match_recursor(&raw(r#"<xsl:import href="path/to/file.xsl"/>"#))
            .unwrap();
        assert_eq!(found, Some(vec!["path/to/file.xsl".to_string()]));

        let found = tech
            .match_recursor(&raw(r#"SYSTEM "/path/to/file.ent">"#))
            .unwrap();
        assert_eq!(found, Some(vec!["/path/to/file.ent".to_string()]));

        let found = tech
            .match_recursor(&raw(r#"href="path/to/file.ololo"/>"#))
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_match_freeze() {
        let tech = XsltTech::new("/");
        for (text, expected) in [
            (r#"src="path/to/file.js"/>"#, "path/to/file.js"),
            (r#"src='/i/logo.png'"#, "/i/logo.png"),
            (r#"href="a.jpeg""#, "a.jpeg"),
            (r#"href="a.jpg""#, "a.jpg"),
        ] {
            assert_eq!(
                tech.match_freeze(&raw(text)).unwrap(),
                Some(vec![expected.to_string()]),
                "{text}"
            );
        }
    }

    #[test]
    fn test_match_freeze_skips_external() {
        let tech = XsltTech::new("/");
        for text in [
            r#"src="//path/to/file.js""#,
            r#"src="http://path/to/file.js""#,
            r#"src="https://path/to/file.js""#,
            r#"href="path/to/file.ololo""#,
        ] {
            assert_eq!(tech.match_freeze(&raw(text)).unwrap(), None, "{text}");
        }
    }

    #[test]
    fn test_multiple_references_keep_order() {
        let tech = XsltTech::new("/");
        let found = tech
            .match_freeze(&raw(r#"a="x.css"b="//cdn/y.js"c='z.gif'"#))
            .unwrap();
        assert_eq!(found, Some(vec!["x.css".to_string(), "z.gif".to_string()]));
    }
}

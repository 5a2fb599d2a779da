//! `[grammar]` section configuration.
//!
//! ```toml
//! [grammar]
//! block_comments = ["<!--", "-->"]   # [] disables comment containers
//! line_comment = ""                  # e.g. "//"; empty disables
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::tech::xslt;

const BLOCK_COMMENTS: FieldPath = FieldPath::new("grammar.block_comments");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub block_comments: Vec<String>,
    pub line_comment: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        let (start, end) = xslt::COMMENTS;
        Self {
            block_comments: vec![start.to_string(), end.to_string()],
            line_comment: String::new(),
        }
    }
}

impl GrammarConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !matches!(self.block_comments.len(), 0 | 2) {
            diag.error_with_hint(
                BLOCK_COMMENTS,
                format!(
                    "expected a start/end pair, got {} item(s)",
                    self.block_comments.len()
                ),
                "block_comments = [\"<!--\", \"-->\"], or [] to disable",
            );
        } else if self.block_comments.iter().any(String::is_empty) {
            diag.error(BLOCK_COMMENTS, "comment delimiters must not be empty");
        }
    }

    pub fn line_comment(&self) -> Option<&str> {
        Some(self.line_comment.as_str()).filter(|prefix| !prefix.is_empty())
    }
}

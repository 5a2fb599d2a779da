//! Technologies: per-markup policies plugged into the freezer.
//!
//! A technology decides which tokens carry references and where those
//! references resolve from. The freezer does everything else.
//!
//! | capability           | default                                  |
//! |----------------------|------------------------------------------|
//! | `match_recursor`     | unimplemented (error on first use)       |
//! | `match_freeze`       | unimplemented (error on first use)       |
//! | `paths_base`         | the carrier's directory                  |
//! | `postprocess_path`   | decline                                  |
//! | `postprocess_value`  | identity                                 |

pub mod xslt;

use std::path::{Path, PathBuf};

use crate::freeze::{FreezeError, Result};
use crate::freeze::path::dir_of;
use crate::grammar::Node;

pub use xslt::XsltTech;

/// Everything known about a rewritten token.
#[derive(Debug, Clone, Copy)]
pub struct ValueContext<'a> {
    pub parent: &'a Path,
    pub carrier: &'a Path,
    /// Token text before substitution.
    pub original: &'a str,
    /// Token text with frozen paths substituted.
    pub value: &'a str,
    /// Raw references matched in the token.
    pub matches: &'a [String],
    /// Index of the token in the carrier.
    pub index: usize,
}

pub trait Technology: Send + Sync + 'static {
    /// Name used in diagnostics and debug annotations.
    fn name(&self) -> &str;

    /// References to other sources that must be built before freezing.
    /// Takes precedence over [`match_freeze`](Self::match_freeze).
    fn match_recursor(&self, _node: &Node) -> Result<Option<Vec<String>>> {
        Err(FreezeError::unimplemented(self.name(), "match_recursor"))
    }

    /// References to already-built artifacts, frozen as they are.
    fn match_freeze(&self, _node: &Node) -> Result<Option<Vec<String>>> {
        Err(FreezeError::unimplemented(self.name(), "match_freeze"))
    }

    /// Directory that `tail`, found inside `carrier`, resolves from.
    fn paths_base(&self, carrier: &Path, _tail: &str) -> PathBuf {
        dir_of(carrier)
    }

    /// Written path for a frozen file, or `None` to use the default rule.
    fn postprocess_path(&self, _parent: &Path, _carrier: &Path, _frozen: &Path) -> Option<String> {
        None
    }

    /// Final rewrite of a token's text.
    fn postprocess_value(&self, ctx: &ValueContext<'_>) -> String {
        ctx.value.to_string()
    }
}

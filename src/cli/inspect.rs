//! `tokens` and `checksum` commands.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::FreezeConfig;
use crate::digest::{Checksum, DigestEncoding, HashAlgorithm};
use crate::grammar::{Grammar, Node, ast};

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))
}

/// Folded token tree of `file`, one token per line.
pub fn tokens(config: &FreezeConfig, file: &Path) -> Result<String> {
    let content = config.freeze.encoding.decode(file, read(file)?)?;
    let options = config.options();
    let grammar = Grammar::with_comments(options.block_comment_pair(), options.line_comment.as_deref());
    let tree = ast::fold(grammar.parse(&content)?, ast::same_siblings);
    Ok(render_tree(&tree))
}

/// `kind start..end "text"`, children indented under their container.
pub fn render_tree(tree: &[Node]) -> String {
    let escaped = ast::walk(tree, &mut |leaf| {
        let mut leaf = leaf.clone();
        leaf.data.text = format!("{:?}", leaf.text());
        leaf
    });
    let mut out = String::new();
    render_level(&escaped, 0, &mut out);
    out
}

fn render_level(nodes: &[Node], depth: usize, out: &mut String) {
    for node in nodes {
        let text = if node.is_leaf() {
            node.text().to_string()
        } else {
            format!("{:?}", node.text())
        };
        writeln!(
            out,
            "{:indent$}{} {}..{} {}",
            "",
            node.kind,
            node.data.start,
            node.data.end,
            text,
            indent = depth * 2
        )
        .ok();
        render_level(&node.children, depth + 1, out);
    }
}

/// Signature `file` would be frozen under.
pub fn checksum(
    config: &FreezeConfig,
    file: &Path,
    hash: Option<HashAlgorithm>,
    digest: Option<DigestEncoding>,
) -> Result<String> {
    let checksum = Checksum::new(
        hash.unwrap_or(config.freeze.hash),
        digest.unwrap_or(config.freeze.digest),
    );
    Ok(checksum.of(&read(file)?))
}

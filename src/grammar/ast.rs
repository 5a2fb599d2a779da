//! Tree helpers: fold adjacent siblings, flatten, walk leaves.

use super::{Ast, Node};

/// Merge rule for [`fold`]: adjacent nodes of the same kind.
pub fn same_siblings(prev: &Node, node: &Node) -> bool {
    prev.kind == node.kind
}

/// Merge each node into its previous sibling while `rule(prev, node)` holds.
///
/// Merged text is concatenated, the end offset is extended and children are
/// appended. Applied recursively into every node's children.
pub fn fold<R>(ast: Ast, rule: R) -> Ast
where
    R: Fn(&Node, &Node) -> bool + Copy,
{
    let mut out: Ast = Vec::with_capacity(ast.len());
    for node in ast {
        match out.last_mut() {
            Some(prev) if rule(prev, &node) => {
                prev.data.text.push_str(&node.data.text);
                prev.data.end = prev.data.start + prev.data.len();
                prev.children.extend(node.children);
            }
            _ => out.push(node),
        }
    }

    for node in &mut out {
        if !node.children.is_empty() {
            node.children = fold(std::mem::take(&mut node.children), rule);
        }
    }
    out
}

/// Depth-first linearization; every returned node has no children.
pub fn flatten(ast: &[Node]) -> Ast {
    let mut out = Vec::new();
    flatten_into(ast, &mut out);
    out
}

fn flatten_into(ast: &[Node], out: &mut Ast) {
    for node in ast {
        out.push(Node::leaf(node.kind, node.data.clone()));
        flatten_into(&node.children, out);
    }
}

/// Apply `f` to every leaf, keeping branch nodes (and their data) intact.
pub fn walk<F>(ast: &[Node], f: &mut F) -> Ast
where
    F: FnMut(&Node) -> Node,
{
    ast.iter()
        .map(|node| {
            if node.is_leaf() {
                f(node)
            } else {
                Node::new(node.kind, node.data.clone(), walk(&node.children, f))
            }
        })
        .collect()
}

/// Concatenated source text of a tree, in document order.
pub fn text_of(ast: &[Node]) -> String {
    flatten(ast).into_iter().map(|node| node.data.text).collect()
}

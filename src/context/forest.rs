//! Structure forests: flat parent-indexed declarations rebuilt into trees

use super::matching::{impl_self_type, insert_fn_name, names_owner};
use crate::provider::{NodeKind, StructureNode};

/// A declaration together with the declarations nested in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub node: StructureNode,
    pub children: Vec<TreeNode>,
}

/// Sibling declaration trees from one file, in source order
pub type Forest = Vec<TreeNode>;

impl TreeNode {
    pub fn new(node: StructureNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Rebuild trees from a flat list, then keep only functions and impl
    /// blocks at every level.
    pub fn from_flat(nodes: Vec<StructureNode>) -> Forest {
        prune(build(nodes), &|n: &TreeNode| n.node.kind.is_function_or_impl(), None)
    }

    /// One-line header: the impl label, the function signature with its
    /// name, or the bare label for anything else
    pub fn header(&self) -> String {
        match self.node.kind {
            NodeKind::Function => match &self.node.detail {
                Some(detail) => insert_fn_name(detail, &self.node.label),
                None => self.node.label.clone(),
            },
            NodeKind::Impl | NodeKind::Other(_) => self.node.label.clone(),
        }
    }

    /// Whether this node renders as a `header { ... }` block
    pub fn is_block(&self) -> bool {
        self.node.kind == NodeKind::Impl || !self.children.is_empty()
    }

    /// Render as a block, always opening braces for impl blocks
    pub fn render(&self) -> String {
        if !self.is_block() {
            return match self.node.kind {
                NodeKind::Function => format!("{};", self.header()),
                _ => self.header(),
            };
        }
        let mut out = format!("{} {{", self.header());
        for child in &self.children {
            out.push('\n');
            out.push_str(&child.render());
        }
        out.push_str("\n}");
        out
    }

    /// Declaration-only rendering.
    ///
    /// A node without children is its header, a node with a single child
    /// collapses to that child, and only wider nodes open a block.
    pub fn render_declaration(&self) -> String {
        match self.children.as_slice() {
            [] => self.header(),
            [only] => only.render_declaration(),
            _ => {
                let mut out = format!("{} {{", self.header());
                for child in &self.children {
                    out.push('\n');
                    out.push_str(&child.render_declaration());
                }
                out.push_str("\n}");
                out
            }
        }
    }
}

/// Link nodes to their parents without filtering.
///
/// Parent indices must reference an earlier record; anything else turns the
/// node into a root.
pub fn build(nodes: Vec<StructureNode>) -> Forest {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        match node.parent {
            Some(parent) if parent < idx => children[parent].push(idx),
            Some(parent) => {
                tracing::warn!(
                    "Structure node {} ('{}') has invalid parent index {}; treating it as a root",
                    idx,
                    node.label,
                    parent
                );
                roots.push(idx);
            }
            None => roots.push(idx),
        }
    }

    let mut slots: Vec<Option<StructureNode>> = nodes.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|idx| assemble(idx, &mut slots, &children))
        .collect()
}

fn assemble(
    idx: usize,
    slots: &mut [Option<StructureNode>],
    children: &[Vec<usize>],
) -> Option<TreeNode> {
    let node = slots.get_mut(idx)?.take()?;
    let mut tree = TreeNode::new(node);
    for &child in &children[idx] {
        if let Some(subtree) = assemble(child, slots, children) {
            tree.children.push(subtree);
        }
    }
    Some(tree)
}

/// Keep the nodes accepted by `predicate`.
///
/// `max_depth` of `None` applies the predicate at every level, `Some(0)`
/// only at this level, and `Some(n)` at this level and `n` more below it.
/// A rejected node takes its whole subtree with it.
pub fn prune(
    roots: Forest,
    predicate: &dyn Fn(&TreeNode) -> bool,
    max_depth: Option<usize>,
) -> Forest {
    roots
        .into_iter()
        .filter(|tree| predicate(tree))
        .map(|mut tree| {
            let next = match max_depth {
                None => Some(None),
                Some(0) => None,
                Some(n) => Some(Some(n - 1)),
            };
            if let Some(depth) = next {
                tree.children = prune(std::mem::take(&mut tree.children), predicate, depth);
            }
            tree
        })
        .collect()
}

/// Keep only the top-level impl blocks whose self type names `type_name`
pub fn filter_by_impl_owner(roots: Forest, type_name: &str) -> Forest {
    prune(
        roots,
        &|tree: &TreeNode| {
            tree.node.kind == NodeKind::Impl
                && names_owner(impl_self_type(&tree.node.label), type_name)
        },
        Some(0),
    )
}

#[cfg(test)]
mod tests;

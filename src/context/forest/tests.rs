//! Tests for forest construction, pruning and owner filtering

use super::*;

fn func(name: &str, detail: &str) -> StructureNode {
    StructureNode::new(name, NodeKind::Function).with_detail(detail)
}

fn imp(label: &str) -> StructureNode {
    StructureNode::new(label, NodeKind::Impl)
}

fn other(label: &str) -> StructureNode {
    StructureNode::new(label, NodeKind::Other("struct_item".to_string()))
}

fn labels(forest: &Forest) -> Vec<&str> {
    forest.iter().map(|t| t.node.label.as_str()).collect()
}

#[test]
fn test_build_links_children() {
    let forest = build(vec![
        imp("impl Foo"),
        func("a", "fn(&self)").with_parent(0),
        func("b", "fn(&self)").with_parent(0),
        func("free", "fn()"),
    ]);
    assert_eq!(labels(&forest), vec!["impl Foo", "free"]);
    assert_eq!(forest[0].children.len(), 2);
    assert_eq!(forest[0].children[1].node.label, "b");
}

#[test]
fn test_build_invalid_parent_becomes_root() {
    let forest = build(vec![
        func("a", "fn()").with_parent(5),
        func("b", "fn()").with_parent(1),
    ]);
    assert_eq!(labels(&forest), vec!["a", "b"]);
}

#[test]
fn test_from_flat_prunes_other_kinds_with_subtree() {
    let forest = TreeNode::from_flat(vec![
        other("mod inner"),
        imp("impl Hidden").with_parent(0),
        imp("impl Foo"),
        other("const X").with_parent(2),
        func("a", "fn(&self)").with_parent(2),
    ]);
    assert_eq!(labels(&forest), vec!["impl Foo"]);
    assert_eq!(labels(&forest[0].children), vec!["a"]);
}

#[test]
fn test_pruning_soundness() {
    let forest = TreeNode::from_flat(vec![
        imp("impl Foo"),
        other("struct Inner").with_parent(0),
        func("nested", "fn()").with_parent(1),
        func("kept", "fn()").with_parent(0),
    ]);

    fn check(forest: &Forest) {
        for tree in forest {
            assert!(tree.node.kind.is_function_or_impl());
            check(&tree.children);
        }
    }
    check(&forest);
    assert_eq!(labels(&forest[0].children), vec!["kept"]);
}

#[test]
fn test_prune_depth_zero_keeps_children() {
    let forest = build(vec![imp("impl Foo"), other("struct X").with_parent(0)]);
    let pruned = prune(forest, &|t: &TreeNode| t.node.kind == NodeKind::Impl, Some(0));
    assert_eq!(pruned[0].children.len(), 1);
}

#[test]
fn test_prune_bounded_depth() {
    let forest = build(vec![
        imp("impl Foo"),
        func("a", "fn()").with_parent(0),
        other("struct Deep").with_parent(1),
    ]);
    let pruned = prune(
        forest,
        &|t: &TreeNode| t.node.kind.is_function_or_impl(),
        Some(1),
    );
    assert_eq!(pruned[0].children.len(), 1);
    // third level is below the depth limit and left untouched
    assert_eq!(pruned[0].children[0].children.len(), 1);
}

#[test]
fn test_filter_by_impl_owner() {
    let forest = TreeNode::from_flat(vec![
        imp("impl Foo"),
        imp("impl Foobar"),
        imp("impl Display for Foo"),
        imp("impl From<Foo> for Bar"),
        func("free", "fn()"),
        imp("impl Foo"),
    ]);
    let filtered = filter_by_impl_owner(forest, "Foo");
    assert_eq!(
        labels(&filtered),
        vec!["impl Foo", "impl Display for Foo", "impl Foo"]
    );
}

#[test]
fn test_render_impl_block() {
    let forest = TreeNode::from_flat(vec![
        imp("impl Foo"),
        func("new", "pub fn() -> Self").with_parent(0),
        func("len", "pub fn(&self) -> usize").with_parent(0),
    ]);
    assert_eq!(
        forest[0].render(),
        "impl Foo {\npub fn new() -> Self;\npub fn len(&self) -> usize;\n}"
    );

    let empty = TreeNode::new(imp("impl Marker"));
    assert_eq!(empty.render(), "impl Marker {\n}");
}

#[test]
fn test_render_declaration() {
    let single = TreeNode::from_flat(vec![imp("impl Foo"), func("a", "fn(&self)").with_parent(0)]);
    assert_eq!(single[0].render_declaration(), "fn a(&self)");

    let wide = TreeNode::from_flat(vec![
        imp("impl Foo"),
        func("a", "fn(&self)").with_parent(0),
        func("b", "fn(&self)").with_parent(0),
    ]);
    assert_eq!(
        wide[0].render_declaration(),
        "impl Foo {\nfn a(&self)\nfn b(&self)\n}"
    );

    let bare = TreeNode::new(imp("impl Foo"));
    assert_eq!(bare.render_declaration(), "impl Foo");
}

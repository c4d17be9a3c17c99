//! Ordered, deduplicated buffer of rendered declarations

use super::forest::TreeNode;
use super::typedef::TypeDef;
use crate::paths::trim_to_project_root;
use std::fmt;

/// Collects rendered type cards and impl blocks in discovery order.
///
/// In merge mode impl blocks sharing a header collapse into the first entry
/// seen for that header; otherwise every tree is rendered on its own.
#[derive(Debug, Default)]
pub struct Accumulator {
    entries: Vec<String>,
    merge: bool,
}

impl Accumulator {
    pub fn new(merge: bool) -> Self {
        Self {
            entries: Vec::new(),
            merge,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a type card, optionally prefixed with its trimmed path.
    ///
    /// Every line is trimmed and blank lines are dropped. Returns whether a
    /// new entry was added.
    pub fn append_typedef(
        &mut self,
        typedef: &TypeDef,
        include_path: bool,
        root_marker: &str,
    ) -> bool {
        let mut text = trim_lines(typedef.text());
        if include_path {
            let path = typedef.path().to_string_lossy();
            text = format!("// {}\n{}", trim_to_project_root(&path, root_marker), text);
        }
        self.push_unique(text)
    }

    /// Append an implementation tree. Returns whether the buffer changed.
    pub fn append_node(&mut self, tree: &TreeNode) -> bool {
        if !self.merge {
            return self.push_unique(trim_lines(&tree.render_declaration()));
        }
        if !tree.is_block() {
            return self.push_unique(trim_lines(&tree.render()));
        }

        let opening = format!("{} {{", tree.header().trim());
        let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.lines().next() == Some(opening.as_str()))
        else {
            return self.push_unique(trim_lines(&tree.render()));
        };

        let mut changed = false;
        for child in &tree.children {
            let child_text = trim_lines(&child.render());
            let single_line = !child_text.contains('\n');
            if single_line && existing.lines().any(|line| line == child_text) {
                continue;
            }
            let Some(close) = existing.rfind("\n}") else {
                continue;
            };
            existing.insert_str(close, &format!("\n{}", child_text));
            changed = true;
        }
        changed
    }

    fn push_unique(&mut self, text: String) -> bool {
        if text.is_empty() || self.entries.contains(&text) {
            return false;
        }
        self.entries.push(text);
        true
    }
}

impl fmt::Display for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entries.join("\n"))
    }
}

fn trim_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

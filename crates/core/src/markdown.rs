#![forbid(unsafe_code)]

use crate::model::TaskState;
use crate::tree::TaskTree;
use std::fmt::Write as _;

/// Renders the tree as a markdown checklist. Pure projection over
/// `TaskTree::list`: identifiers on every line are recomputed from
/// position, so the rendering is always consistent with the current
/// structure. An empty tree renders as just the header.
pub fn render_markdown(tree: &TaskTree) -> String {
    let mut out = String::from("# Task List\n");
    for (path, node) in tree.list(None) {
        let indent = "  ".repeat(path.depth() - 1);
        let checkbox = if node.state == TaskState::Completed {
            'x'
        } else {
            ' '
        };
        let _ = writeln!(out, "{indent}- [{checkbox}] {path}: {}", node.description);
    }
    out
}

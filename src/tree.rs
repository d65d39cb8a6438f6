//! Archive entry list to nested tree.
//!
//! Archive formats list their contents as flat paths, in whatever order the
//! archiver wrote them, and may or may not include explicit directory
//! records. [`build_tree`] turns such a list into a folder-first, sorted,
//! nested tree with exactly one node per distinct path prefix.
//!
//! ## Rules
//!
//! - Names are split on `/`; empty segments are dropped, so leading,
//!   trailing and doubled slashes do not create nodes.
//! - Intermediate directories are synthesized when no entry names them.
//! - When the same path is listed more than once, the first entry decides
//!   `is_dir` and `size`.
//! - A node that ends up with children is a directory, whatever its own
//!   entry said.
//! - Siblings are ordered directories first, then by name.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One record per item inside an inspected archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

impl ArchiveEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            is_dir: true,
        }
    }
}

/// A folder or file in the preview tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "isDir")]
    pub is_dir: bool,
    pub size: u64,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    /// Sum of file sizes below (or at) this node.
    pub fn total_size(&self) -> u64 {
        if self.children.is_empty() {
            self.size
        } else {
            self.children.iter().map(TreeNode::total_size).sum()
        }
    }
}

/// Node under construction. Children are indices into the arena.
struct PendingNode {
    name: String,
    path: String,
    is_dir: bool,
    size: u64,
    children: Vec<usize>,
}

/// Build the ordered root list for a flat archive listing.
///
/// Never fails: entries that reduce to no segments are skipped, and an
/// empty input yields an empty root list.
pub fn build_tree(entries: &[ArchiveEntry]) -> Vec<TreeNode> {
    let mut arena: Vec<PendingNode> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    // Full path prefix -> arena index
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let segments: Vec<&str> = entry.name.split('/').filter(|s| !s.is_empty()).collect();
        let last = match segments.len().checked_sub(1) {
            Some(last) => last,
            None => continue,
        };

        let mut parent: Option<usize> = None;
        let mut prefix = String::with_capacity(entry.name.len());

        for (depth, segment) in segments.iter().enumerate() {
            if depth > 0 {
                prefix.push('/');
            }
            prefix.push_str(segment);

            let node = match index.get(&prefix) {
                Some(&existing) => existing,
                None => {
                    let terminal_file = depth == last && !entry.is_dir;
                    let id = arena.len();
                    arena.push(PendingNode {
                        name: (*segment).to_string(),
                        path: prefix.clone(),
                        is_dir: !terminal_file,
                        size: if terminal_file { entry.size } else { 0 },
                        children: Vec::new(),
                    });
                    index.insert(prefix.clone(), id);
                    match parent {
                        Some(p) => arena[p].children.push(id),
                        None => roots.push(id),
                    }
                    id
                }
            };

            parent = Some(node);
        }
    }

    let mut tree: Vec<TreeNode> = roots.into_iter().map(|id| assemble(&arena, id)).collect();
    sort_siblings(&mut tree);
    tree
}

fn assemble(arena: &[PendingNode], id: usize) -> TreeNode {
    let pending = &arena[id];
    let children: Vec<TreeNode> = pending
        .children
        .iter()
        .map(|&child| assemble(arena, child))
        .collect();

    // A file entry that later gained children is really a folder.
    let is_dir = pending.is_dir || !children.is_empty();

    TreeNode {
        name: pending.name.clone(),
        path: pending.path.clone(),
        is_dir,
        size: if is_dir { 0 } else { pending.size },
        children,
    }
}

/// Sort every sibling list in place, bottom-up.
pub fn sort_siblings(nodes: &mut [TreeNode]) {
    for node in nodes.iter_mut() {
        sort_siblings(&mut node.children);
    }
    nodes.sort_by(compare_nodes);
}

/// Directories first, then names in locale-style order.
pub fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.is_dir, b.is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_names(&a.name, &b.name),
    }
}

/// Case-insensitive primary ordering with a code-point tie-break, so
/// `Alpha < beta < Zeta` while `B` and `b` still have a stable order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Flatten a tree back into depth-first `(depth, node)` pairs.
pub fn walk(nodes: &[TreeNode]) -> Vec<(usize, &TreeNode)> {
    fn visit<'a>(nodes: &'a [TreeNode], depth: usize, out: &mut Vec<(usize, &'a TreeNode)>) {
        for node in nodes {
            out.push((depth, node));
            visit(&node.children, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    visit(nodes, 0, &mut out);
    out
}

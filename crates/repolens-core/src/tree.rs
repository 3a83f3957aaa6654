//! Nested folder/file tree built from a flat repository listing.
//!
//! The tree stores children in unordered maps. Display order (folders before
//! files, then by name) is derived on demand by [`ordered_children`] and
//! [`FileTree::rows`].

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::warn;

use crate::source::FileEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Folder { children: HashMap<String, TreeNode> },
    File { entry: FileEntry },
}

impl TreeNode {
    fn empty_folder() -> Self {
        Self::Folder {
            children: HashMap::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    pub fn children(&self) -> Option<&HashMap<String, TreeNode>> {
        match self {
            Self::Folder { children } => Some(children),
            Self::File { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Folder,
    File,
}

/// One visible line of the tree in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub kind: RowKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    root: HashMap<String, TreeNode>,
    conflicts: Vec<String>,
}

impl FileTree {
    pub fn root(&self) -> &HashMap<String, TreeNode> {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Paths that were left out because a file and a folder claimed the same position.
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut level = &self.root;
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            let node = level.get(segment)?;
            if segments.peek().is_none() {
                return Some(node);
            }
            level = node.children()?;
        }
        None
    }

    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        match self.find(path)? {
            TreeNode::File { entry } => Some(entry),
            TreeNode::Folder { .. } => None,
        }
    }

    pub fn file_count(&self) -> usize {
        count(&self.root, |node| !node.is_folder())
    }

    pub fn folder_count(&self) -> usize {
        count(&self.root, TreeNode::is_folder)
    }

    /// Flattens the whole tree in display order.
    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        push_rows(&self.root, "", 0, &mut rows);
        rows
    }
}

pub fn build_tree(entries: impl IntoIterator<Item = FileEntry>) -> FileTree {
    let mut tree = FileTree::default();

    for entry in entries {
        let path = entry.path.clone();
        if insert_entry(&mut tree.root, entry).is_err() {
            warn!(path = %path, "file and folder share a tree position; entry skipped");
            tree.conflicts.push(path);
        }
    }

    tree
}

fn insert_entry(root: &mut HashMap<String, TreeNode>, entry: FileEntry) -> Result<(), ()> {
    let path = entry.path.clone();
    let segments: Vec<&str> = path.split('/').collect();
    let Some((file_name, folders)) = segments.split_last() else {
        return Err(());
    };

    let mut level = root;
    for folder in folders {
        let node = level
            .entry((*folder).to_string())
            .or_insert_with(TreeNode::empty_folder);
        level = match node {
            TreeNode::Folder { children } => children,
            TreeNode::File { .. } => return Err(()),
        };
    }

    if matches!(level.get(*file_name), Some(TreeNode::Folder { .. })) {
        return Err(());
    }

    level.insert((*file_name).to_string(), TreeNode::File { entry });
    Ok(())
}

/// Children of one folder in display order: folders first, then by name.
pub fn ordered_children(children: &HashMap<String, TreeNode>) -> Vec<(&str, &TreeNode)> {
    let mut ordered: Vec<(&str, &TreeNode)> = children
        .iter()
        .map(|(name, node)| (name.as_str(), node))
        .collect();
    ordered.sort_by(|(left_name, left), (right_name, right)| {
        match (left.is_folder(), right.is_folder()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => left_name.cmp(right_name),
        }
    });
    ordered
}

fn push_rows(
    children: &HashMap<String, TreeNode>,
    prefix: &str,
    depth: usize,
    rows: &mut Vec<TreeRow>,
) {
    for (name, node) in ordered_children(children) {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };

        match node {
            TreeNode::Folder { children } => {
                rows.push(TreeRow {
                    depth,
                    name: name.to_string(),
                    path: path.clone(),
                    kind: RowKind::Folder,
                });
                push_rows(children, &path, depth + 1, rows);
            }
            TreeNode::File { .. } => rows.push(TreeRow {
                depth,
                name: name.to_string(),
                path,
                kind: RowKind::File,
            }),
        }
    }
}

fn count(children: &HashMap<String, TreeNode>, predicate: fn(&TreeNode) -> bool) -> usize {
    children
        .values()
        .map(|node| {
            let own = usize::from(predicate(node));
            own + node
                .children()
                .map(|nested| count(nested, predicate))
                .unwrap_or(0)
        })
        .sum()
}

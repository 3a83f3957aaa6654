//! Cursor and folder expansion over a [`FileTree`], plus the widget items
//! that render it.

use std::collections::{BTreeSet, HashMap};
use std::io;

use repolens_core::tree::{FileTree, RowKind, TreeNode, TreeRow, ordered_children};
use tui_tree_widget::{TreeItem, TreeState};

#[derive(Debug, Clone, Default)]
pub(crate) struct TreeView {
    rows: Vec<TreeRow>,
    collapsed: BTreeSet<String>,
    cursor: usize,
}

impl TreeView {
    /// Starts with every folder collapsed so large repositories open at their top level.
    pub(crate) fn new(tree: &FileTree) -> Self {
        let rows = tree.rows();
        let collapsed = rows
            .iter()
            .filter(|row| row.kind == RowKind::Folder)
            .map(|row| row.path.clone())
            .collect();
        Self {
            rows,
            collapsed,
            cursor: 0,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn visible(&self) -> Vec<&TreeRow> {
        self.rows
            .iter()
            .filter(|row| !self.hidden_by_collapsed_ancestor(&row.path))
            .collect()
    }

    fn hidden_by_collapsed_ancestor(&self, path: &str) -> bool {
        ancestors(path).any(|ancestor| self.collapsed.contains(ancestor))
    }

    pub(crate) fn current(&self) -> Option<&TreeRow> {
        self.visible().get(self.cursor).copied()
    }

    pub(crate) fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(crate) fn move_down(&mut self) {
        if self.cursor + 1 < self.visible().len() {
            self.cursor += 1;
        }
    }

    /// Opens or closes the folder under the cursor. Returns false on a file row.
    pub(crate) fn toggle_current(&mut self) -> bool {
        let Some(row) = self.current() else {
            return false;
        };
        if row.kind != RowKind::Folder {
            return false;
        }
        let path = row.path.clone();
        if !self.collapsed.remove(&path) {
            self.collapsed.insert(path);
        }
        true
    }

    pub(crate) fn expand_current(&mut self) {
        if let Some(row) = self.current()
            && row.kind == RowKind::Folder
        {
            let path = row.path.clone();
            self.collapsed.remove(&path);
        }
    }

    /// Closes an open folder, otherwise jumps to the parent folder.
    pub(crate) fn collapse_or_parent(&mut self) {
        let Some(row) = self.current() else {
            return;
        };
        let path = row.path.clone();
        if row.kind == RowKind::Folder && !self.collapsed.contains(&path) {
            self.collapsed.insert(path);
            return;
        }

        let Some(parent) = ancestors(&path).last() else {
            return;
        };
        if let Some(index) = self.visible().iter().position(|row| row.path == parent) {
            self.cursor = index;
        }
    }

    /// Expands the ancestors of `path` and moves the cursor onto it.
    pub(crate) fn reveal(&mut self, path: &str) {
        for ancestor in ancestors(path) {
            self.collapsed.remove(ancestor);
        }
        if let Some(index) = self.visible().iter().position(|row| row.path == path) {
            self.cursor = index;
        }
    }

    pub(crate) fn tree_state(&self) -> TreeState<String> {
        let mut state = TreeState::default();
        for row in self.visible() {
            if row.kind == RowKind::Folder && !self.collapsed.contains(&row.path) {
                state.open(identifier_path(&row.path));
            }
        }
        if let Some(row) = self.current() {
            state.select(identifier_path(&row.path));
        }
        state
    }
}

/// Proper ancestors of a slash-separated path, outermost first.
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(index, _)| &path[..index])
}

/// Identifier path the tree widget uses to address the row for `path`.
pub(crate) fn identifier_path(path: &str) -> Vec<String> {
    ancestors(path)
        .chain(std::iter::once(path))
        .map(str::to_string)
        .collect()
}

/// Widget items for the whole tree, keyed by full path.
pub(crate) fn tree_items(tree: &FileTree) -> io::Result<Vec<TreeItem<'static, String>>> {
    items_for(tree.root(), "")
}

fn items_for(
    children: &HashMap<String, TreeNode>,
    prefix: &str,
) -> io::Result<Vec<TreeItem<'static, String>>> {
    ordered_children(children)
        .into_iter()
        .map(|(name, node)| {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}/{name}")
            };
            match node {
                TreeNode::Folder { children } => {
                    let nested = items_for(children, &path)?;
                    TreeItem::new(path, format!("{name}/"), nested)
                }
                TreeNode::File { .. } => Ok(TreeItem::new_leaf(path, name.to_string())),
            }
        })
        .collect()
}

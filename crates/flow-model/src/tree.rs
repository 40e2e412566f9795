//! Generic operations over recursively nested, labeled nodes.
//!
//! Navigation trees ([`NavItem`](crate::NavItem)) and search-result trees
//! ([`MatchResult`](crate::MatchResult)) share the same shape: an id, an
//! optional render depth, a collapsed/expanded flag and ordered children.
//! [`TreeNode`] captures that shape so the walkers below work on both.

/// A node in a labeled tree.
///
/// Child order is document order and must be preserved by implementors.
pub trait TreeNode: Sized {
    /// Stable identifier used by [`find`].
    fn id(&self) -> &str;

    /// Whether the node's children are shown. Collapsed by default.
    fn expanded(&self) -> bool;

    fn set_expanded(&mut self, expanded: bool);

    /// Render depth assigned by [`flatten`], if any.
    fn depth(&self) -> Option<usize>;

    fn set_depth(&mut self, depth: usize);

    fn subitems(&self) -> &[Self];

    fn subitems_mut(&mut self) -> &mut [Self];

    /// Flip the expanded flag.
    fn toggle(&mut self) {
        let expanded = self.expanded();
        self.set_expanded(!expanded);
    }
}

/// Flatten a tree into the rows a tree view would display.
///
/// A node without children, or a collapsed node, yields only itself. An
/// expanded node yields itself followed by each child flattened one level
/// deeper. Every returned row is a copy carrying its `depth`; the input is
/// left untouched.
pub fn flatten<T: TreeNode + Clone>(node: &T, depth: usize) -> Vec<T> {
    let mut rows = Vec::new();
    flatten_into(node, depth, &mut rows);
    rows
}

fn flatten_into<T: TreeNode + Clone>(node: &T, depth: usize, rows: &mut Vec<T>) {
    let mut row = node.clone();
    row.set_depth(depth);
    rows.push(row);

    if node.expanded() {
        for child in node.subitems() {
            flatten_into(child, depth + 1, rows);
        }
    }
}

/// Find a node by id across a forest.
///
/// The current level is scanned before descending, then each sibling's
/// subtree is searched in order; the first hit wins.
pub fn find<'a, T: TreeNode>(nodes: &'a [T], id: &str) -> Option<&'a T> {
    if let Some(node) = nodes.iter().find(|n| n.id() == id) {
        return Some(node);
    }
    nodes.iter().find_map(|n| find(n.subitems(), id))
}

/// Mutable counterpart of [`find`], with the same visiting order.
pub fn find_mut<'a, T: TreeNode>(nodes: &'a mut [T], id: &str) -> Option<&'a mut T> {
    if let Some(pos) = nodes.iter().position(|n| n.id() == id) {
        return nodes.get_mut(pos);
    }
    nodes
        .iter_mut()
        .find_map(|n| find_mut(n.subitems_mut(), id))
}

/// Visit `node` and then every descendant, parents before children and
/// siblings in order.
pub fn depth_first_visit<T: TreeNode, F: FnMut(&T)>(node: &T, f: &mut F) {
    f(node);
    for child in node.subitems() {
        depth_first_visit(child, f);
    }
}

//! Table-of-contents entries and the navigation tree.
//!
//! Entries reference their parent by id only. [`NavTree`] keeps an id index
//! (the child-index path from the root) so parents are resolved by lookup
//! rather than through back-pointers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::{self, TreeNode};

/// One table-of-contents entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    pub id: String,
    pub label: String,
    pub href: String,
    /// Id of the enclosing entry, `None` at the top level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subitems: Vec<NavItem>,
}

impl NavItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            href: href.into(),
            ..Default::default()
        }
    }

    /// Attach children, setting their `parent` to this entry.
    #[must_use]
    pub fn with_subitems(mut self, subitems: Vec<NavItem>) -> Self {
        self.subitems = subitems
            .into_iter()
            .map(|mut child| {
                child.parent = Some(self.id.clone());
                child
            })
            .collect();
        self
    }
}

impl TreeNode for NavItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn expanded(&self) -> bool {
        self.expanded
    }

    fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    fn depth(&self) -> Option<usize> {
        self.depth
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = Some(depth);
    }

    fn subitems(&self) -> &[Self] {
        &self.subitems
    }

    fn subitems_mut(&mut self) -> &mut [Self] {
        &mut self.subitems
    }
}

/// A document's table of contents with an id index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavTree {
    toc: Vec<NavItem>,
    /// id -> child-index path from the top level.
    by_id: HashMap<String, Vec<usize>>,
}

impl NavTree {
    /// Build the tree and its id index. Earlier entries win on duplicate ids.
    ///
    /// Every entry's `parent` is reset to the id of the entry it is nested
    /// under, whatever the engine supplied.
    pub fn new(mut toc: Vec<NavItem>) -> Self {
        assign_parents(&mut toc, None);
        let mut by_id = HashMap::new();
        let mut path = Vec::new();
        index_items(&toc, &mut path, &mut by_id);
        Self { toc, by_id }
    }

    /// Top-level entries in document order.
    pub fn toc(&self) -> &[NavItem] {
        &self.toc
    }

    pub fn is_empty(&self) -> bool {
        self.toc.is_empty()
    }

    /// Total number of entries, nested ones included.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Resolve an entry through the id index.
    pub fn get(&self, id: &str) -> Option<&NavItem> {
        let path = self.by_id.get(id)?;
        let (first, rest) = path.split_first()?;
        let mut item = self.toc.get(*first)?;
        for i in rest {
            item = item.subitems.get(*i)?;
        }
        Some(item)
    }

    /// Resolve an entry's parent, if it has one.
    pub fn parent_of(&self, item: &NavItem) -> Option<&NavItem> {
        item.parent.as_deref().and_then(|id| self.get(id))
    }

    /// Entries from the top level down to `id`, inclusive.
    ///
    /// Empty when `id` is unknown.
    pub fn path_to(&self, id: &str) -> Vec<&NavItem> {
        let Some(indices) = self.by_id.get(id) else {
            return Vec::new();
        };
        let mut path = Vec::with_capacity(indices.len());
        let mut level = self.toc.as_slice();
        for i in indices {
            let Some(item) = level.get(*i) else {
                break;
            };
            path.push(item);
            level = &item.subitems;
        }
        path
    }

    /// Flip the expanded flag of the entry with `id`. Returns false if absent.
    pub fn toggle(&mut self, id: &str) -> bool {
        match tree::find_mut(&mut self.toc, id) {
            Some(item) => {
                item.toggle();
                true
            }
            None => false,
        }
    }

    /// First entry, in depth-first order, whose href points at `section_href`.
    pub fn item_for_section(&self, section_href: &str) -> Option<&NavItem> {
        let mut found: Option<&NavItem> = None;
        for item in &self.toc {
            find_first(item, &mut |i| compare_href(section_href, &i.href), &mut found);
            if found.is_some() {
                break;
            }
        }
        found
    }
}

fn find_first<'a>(
    item: &'a NavItem,
    pred: &mut impl FnMut(&NavItem) -> bool,
    found: &mut Option<&'a NavItem>,
) {
    if found.is_some() {
        return;
    }
    if pred(item) {
        *found = Some(item);
        return;
    }
    for child in &item.subitems {
        find_first(child, pred, found);
    }
}

fn assign_parents(items: &mut [NavItem], parent: Option<&str>) {
    for item in items {
        item.parent = parent.map(str::to_string);
        let id = item.id.clone();
        assign_parents(&mut item.subitems, Some(&id));
    }
}

fn index_items(items: &[NavItem], path: &mut Vec<usize>, by_id: &mut HashMap<String, Vec<usize>>) {
    for (i, item) in items.iter().enumerate() {
        path.push(i);
        by_id.entry(item.id.clone()).or_insert_with(|| path.clone());
        index_items(&item.subitems, path, by_id);
        path.pop();
    }
}

/// Whether a section href and a navigation href point at the same file.
///
/// Navigation hrefs may carry a fragment and may be relative to a different
/// directory (`../Text/ch1.html`), so either side being a suffix of the other
/// counts as a match. A navigation href that is only a fragment matches
/// nothing.
pub fn compare_href(section_href: &str, navitem_href: &str) -> bool {
    if section_href.is_empty() || navitem_href.is_empty() {
        return false;
    }
    let target = navitem_href.split('#').next().unwrap_or_default();
    if target.is_empty() {
        return false;
    }
    section_href.ends_with(target) || target.ends_with(section_href)
}

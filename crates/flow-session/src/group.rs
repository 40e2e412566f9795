//! A pane of tabs with one selected.

use std::fmt;

use uuid::Uuid;

use crate::book_tab::BookTab;
use crate::context::SessionContext;
use crate::tab::{Tab, TabParam};

/// An ordered set of tabs shown in one pane.
///
/// A group is never left empty by [`Reader`](crate::Reader); when its last
/// tab goes, the reader removes the group.
pub struct Group {
    id: Uuid,
    tabs: Vec<Tab>,
    selected_index: Option<usize>,
    ctx: SessionContext,
}

impl Group {
    pub fn new(ctx: SessionContext, tabs: Vec<TabParam>) -> Self {
        let mut group = Self {
            id: Uuid::new_v4(),
            tabs: Vec::new(),
            selected_index: None,
            ctx,
        };
        for param in tabs {
            group.add_tab(param);
        }
        group
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.selected_index?)
    }

    pub fn selected_tab_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.selected_index?)
    }

    pub fn tab_mut(&mut self, index: usize) -> Option<&mut Tab> {
        self.tabs.get_mut(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == id)
    }

    /// Document tabs in tab order.
    pub fn book_tabs(&self) -> impl Iterator<Item = &BookTab> {
        self.tabs.iter().filter_map(Tab::as_book)
    }

    pub fn book_tabs_mut(&mut self) -> impl Iterator<Item = &mut BookTab> {
        self.tabs.iter_mut().filter_map(Tab::as_book_mut)
    }

    /// Open `param` right after the selected tab and select it.
    ///
    /// A tab with the same id already in the group is selected instead.
    pub fn add_tab(&mut self, param: impl Into<TabParam>) -> &mut Tab {
        let param = param.into();
        let index = match self.position(param.id()) {
            Some(existing) => existing,
            None => {
                let at = self.selected_index.map_or(0, |i| (i + 1).min(self.tabs.len()));
                tracing::debug!(group = %self.id, tab = param.id(), at, "adding tab");
                self.tabs.insert(at, param.into_tab(&self.ctx));
                at
            }
        };
        self.selected_index = Some(index);
        &mut self.tabs[index]
    }

    /// Remove the tab at `index`. The slot it occupied stays selected,
    /// clamped to the last tab.
    pub fn remove_tab(&mut self, index: usize) -> Option<Tab> {
        if index >= self.tabs.len() {
            return None;
        }
        let tab = self.tabs.remove(index);
        self.selected_index = self.tabs.len().checked_sub(1).map(|last| index.min(last));
        tracing::debug!(group = %self.id, tab = tab.id(), "removed tab");
        Some(tab)
    }

    /// Open `param`, then remove the tab that was at `index` before.
    ///
    /// The selection afterwards follows [`remove_tab`](Self::remove_tab).
    pub fn replace_tab(&mut self, param: impl Into<TabParam>, index: usize) {
        let Some(old_id) = self.tabs.get(index).map(|t| t.id().to_string()) else {
            self.add_tab(param);
            return;
        };
        let new_id = self.add_tab(param).id().to_string();
        if new_id == old_id {
            return;
        }
        if let Some(old) = self.position(&old_id) {
            self.remove_tab(old);
        }
    }

    /// Select the tab at `index`. The index is not validated.
    pub fn select_tab(&mut self, index: usize) {
        self.selected_index = Some(index);
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.id)
            .field("tabs", &self.tabs)
            .field("selected_index", &self.selected_index)
            .finish_non_exhaustive()
    }
}

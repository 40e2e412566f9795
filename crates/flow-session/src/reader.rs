//! Top-level reader: every open group and the one that has focus.

use std::time::Instant;

use flow_model::{BookUpdate, ChangeKind};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use crate::book_tab::BookTab;
use crate::context::SessionContext;
use crate::engine::EngineEvent;
use crate::group::Group;
use crate::tab::{Tab, TabParam};

/// Owns all groups. Created once by the application and passed to whatever
/// needs it.
#[derive(Debug)]
pub struct Reader {
    groups: Vec<Group>,
    /// `None` iff there are no groups.
    focused_index: Option<usize>,
    ctx: SessionContext,
}

impl Reader {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            groups: Vec::new(),
            focused_index: None,
            ctx,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_mut(&mut self, index: usize) -> Option<&mut Group> {
        self.groups.get_mut(index)
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused_index
    }

    pub fn focused_group(&self) -> Option<&Group> {
        self.groups.get(self.focused_index?)
    }

    pub fn focused_group_mut(&mut self) -> Option<&mut Group> {
        self.groups.get_mut(self.focused_index?)
    }

    pub fn focused_tab(&self) -> Option<&Tab> {
        self.focused_group()?.selected_tab()
    }

    pub fn focused_tab_mut(&mut self) -> Option<&mut Tab> {
        self.focused_group_mut()?.selected_tab_mut()
    }

    pub fn focused_book_tab(&self) -> Option<&BookTab> {
        self.focused_tab()?.as_book()
    }

    pub fn focused_book_tab_mut(&mut self) -> Option<&mut BookTab> {
        self.focused_tab_mut()?.as_book_mut()
    }

    /// Every document tab across every group.
    pub fn book_tabs(&self) -> impl Iterator<Item = &BookTab> {
        self.groups.iter().flat_map(Group::book_tabs)
    }

    pub fn book_tabs_mut(&mut self) -> impl Iterator<Item = &mut BookTab> {
        self.groups.iter_mut().flat_map(Group::book_tabs_mut)
    }

    /// Receive record changes of the given kinds from every tab.
    pub fn subscribe(&self, kinds: &[ChangeKind]) -> UnboundedReceiver<BookUpdate> {
        self.ctx.notifier.subscribe(kinds)
    }

    // =========================================================================
    // GROUPS
    // =========================================================================

    /// Insert a group of `tabs` at `index` (after the focused group by
    /// default) and focus it.
    pub fn add_group(&mut self, tabs: Vec<TabParam>, index: Option<usize>) -> &mut Group {
        let default = self.focused_index.map_or(0, |i| i + 1);
        let index = index.unwrap_or(default).min(self.groups.len());

        let group = Group::new(self.ctx.clone(), tabs);
        tracing::debug!(group = %group.id(), index, "adding group");
        self.groups.insert(index, group);
        self.focused_index = Some(index);
        &mut self.groups[index]
    }

    /// Remove the group at `index`; focus moves to the slot it occupied,
    /// clamped to the last group.
    pub fn remove_group(&mut self, index: usize) -> Option<Group> {
        if index >= self.groups.len() {
            return None;
        }
        let group = self.groups.remove(index);
        self.focused_index = self.groups.len().checked_sub(1).map(|last| index.min(last));
        tracing::debug!(group = %group.id(), "removed group");
        Some(group)
    }

    pub fn select_group(&mut self, index: usize) {
        if index < self.groups.len() {
            self.focused_index = Some(index);
        }
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.focused_index = None;
    }

    // =========================================================================
    // TABS
    // =========================================================================

    /// Open `param` in group `group` (the focused one by default), creating a
    /// new group when there is no such group.
    pub fn add_tab(&mut self, param: impl Into<TabParam>, group: Option<usize>) -> &mut Tab {
        let index = match group.or(self.focused_index) {
            Some(i) if i < self.groups.len() => {
                self.focused_index = Some(i);
                i
            }
            _ => {
                self.add_group(Vec::new(), None);
                self.focused_index.unwrap_or_default()
            }
        };
        self.groups[index].add_tab(param)
    }

    /// Remove the tab at `index` of group `group` (the focused one by
    /// default). Removing a group's only tab removes the group.
    pub fn remove_tab(&mut self, index: usize, group: Option<usize>) -> Option<Tab> {
        let group_index = group.or(self.focused_index)?;
        let target = self.groups.get_mut(group_index)?;

        if target.len() == 1 {
            let mut group = self.remove_group(group_index)?;
            return group.remove_tab(0);
        }
        target.remove_tab(index)
    }

    /// Replace the tab at `index` (the selected one by default) of group
    /// `group` (the focused one by default).
    pub fn replace_tab(
        &mut self,
        param: impl Into<TabParam>,
        index: Option<usize>,
        group: Option<usize>,
    ) {
        let Some(target) = group
            .or(self.focused_index)
            .and_then(|i| self.groups.get_mut(i))
        else {
            self.add_tab(param, None);
            return;
        };
        match index.or(target.selected_index()) {
            Some(index) => target.replace_tab(param, index),
            None => {
                target.add_tab(param);
            }
        }
    }

    // =========================================================================
    // HOST LOOP
    // =========================================================================

    /// Re-fit every document tab. A failing tab is logged and skipped.
    pub fn resize(&mut self) {
        for tab in self.book_tabs_mut() {
            if let Err(e) = tab.resize() {
                tracing::error!(book = tab.id(), "resize failed: {e}");
            }
        }
    }

    /// Run searches whose quiet period has passed. Call when the host loop
    /// is idle. Returns how many ran.
    pub fn run_idle(&mut self, now: Instant) -> usize {
        self.book_tabs_mut()
            .map(|tab| tab.run_idle(now))
            .filter(|ran| *ran)
            .count()
    }

    /// Earliest instant at which [`run_idle`](Self::run_idle) has work.
    pub fn next_idle_deadline(&self) -> Option<Instant> {
        self.book_tabs().filter_map(BookTab::next_search_deadline).min()
    }

    /// Route an engine completion to the document tab it belongs to.
    /// Returns false when the tab is gone.
    pub fn dispatch(&mut self, group_id: Uuid, tab_id: &str, event: EngineEvent) -> bool {
        let tab = self
            .groups
            .iter_mut()
            .find(|g| g.id() == group_id)
            .and_then(|g| g.book_tabs_mut().find(|t| t.id() == tab_id));
        match tab {
            Some(tab) => {
                tab.handle_event(event);
                true
            }
            None => {
                tracing::debug!(%group_id, tab_id, event = event.name(), "dropping late engine event");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use flow_common::Settings;

    use super::*;
    use crate::store::MemoryRecordStore;
    use crate::tab::UtilityTab;

    fn reader() -> Reader {
        Reader::new(SessionContext::new(
            Rc::new(MemoryRecordStore::new()),
            Settings::default(),
        ))
    }

    #[test]
    fn test_add_tab_without_groups_creates_one() {
        let mut reader = reader();
        reader.add_tab(UtilityTab::new("library"), None);
        assert_eq!(reader.groups().len(), 1);
        assert_eq!(reader.focused_index(), Some(0));
        assert_eq!(reader.focused_tab().map(Tab::id), Some("library"));
    }

    #[test]
    fn test_add_tab_to_unknown_group_creates_one() {
        let mut reader = reader();
        reader.add_tab(UtilityTab::new("a"), None);
        reader.add_tab(UtilityTab::new("b"), Some(7));
        assert_eq!(reader.groups().len(), 2);
        assert_eq!(reader.focused_index(), Some(1));
    }

    #[test]
    fn test_add_group_inserts_after_focused() {
        let mut reader = reader();
        reader.add_group(vec![UtilityTab::new("a").into()], None);
        reader.add_group(vec![UtilityTab::new("c").into()], None);
        reader.select_group(0);
        reader.add_group(vec![UtilityTab::new("b").into()], None);

        let firsts: Vec<_> = reader
            .groups()
            .iter()
            .filter_map(|g| g.tabs().first().map(Tab::id))
            .collect();
        assert_eq!(firsts, ["a", "b", "c"]);
        assert_eq!(reader.focused_index(), Some(1));
    }

    #[test]
    fn test_remove_only_tab_removes_group() {
        let mut reader = reader();
        reader.add_group(vec![UtilityTab::new("a").into()], None);
        reader.add_group(vec![UtilityTab::new("b").into()], None);

        let removed = reader.remove_tab(0, Some(1)).unwrap();
        assert_eq!(removed.id(), "b");
        assert_eq!(reader.groups().len(), 1);
        assert_eq!(reader.focused_index(), Some(0));

        reader.remove_tab(0, None);
        assert!(reader.groups().is_empty());
        assert_eq!(reader.focused_index(), None);
    }

    #[test]
    fn test_remove_from_single_tab_group_ignores_index() {
        let mut reader = reader();
        reader.add_group(vec![UtilityTab::new("a").into()], None);
        reader.add_group(vec![UtilityTab::new("b").into()], None);

        let removed = reader.remove_tab(3, Some(0)).unwrap();
        assert_eq!(removed.id(), "a");
        assert_eq!(reader.groups().len(), 1);
        assert_eq!(reader.groups()[0].tabs()[0].id(), "b");
    }

    #[test]
    fn test_remove_tab_from_larger_group_delegates() {
        let mut reader = reader();
        reader.add_group(
            vec![UtilityTab::new("a").into(), UtilityTab::new("b").into()],
            None,
        );
        let removed = reader.remove_tab(1, None).unwrap();
        assert_eq!(removed.id(), "b");
        assert_eq!(reader.groups().len(), 1);
        assert_eq!(reader.groups()[0].len(), 1);
    }

    #[test]
    fn test_replace_defaults_to_selected_tab() {
        let mut reader = reader();
        reader.add_group(
            vec![UtilityTab::new("a").into(), UtilityTab::new("b").into()],
            None,
        );
        reader.replace_tab(UtilityTab::new("c"), None, None);
        let ids: Vec<_> = reader.groups()[0].tabs().iter().map(Tab::id).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut reader = reader();
        reader.add_tab(UtilityTab::new("a"), None);
        reader.clear();
        assert!(reader.groups().is_empty());
        assert!(reader.focused_group().is_none());
    }
}

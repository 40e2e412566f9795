mod support;

use std::rc::Rc;
use std::time::{Duration, Instant};

use flow_model::{BookRecord, ChangeKind};
use flow_session::{
    DocumentFile, EngineEvent, Group, MemoryRecordStore, Reader, RenderTarget, Tab, TabParam,
    UtilityTab,
};
use proptest::prelude::*;
use support::{FakeEngine, context, location, moby_sections};

fn reader_with_books(ids: &[&str]) -> (Reader, Rc<MemoryRecordStore>) {
    let store = Rc::new(MemoryRecordStore::new());
    for id in ids {
        store.insert_book(BookRecord::new(*id, format!("{id}.epub"), 512));
        store.insert_file(DocumentFile::new(*id, vec![1u8; 8]));
    }
    (Reader::new(context(Rc::clone(&store))), store)
}

fn utility_group(reader: &Reader, count: usize) -> Group {
    let tabs = (0..count)
        .map(|i| TabParam::from(UtilityTab::new(format!("pane-{i}"))))
        .collect();
    Group::new(reader.context().clone(), tabs)
}

#[test]
fn add_existing_book_selects_it() {
    let (mut reader, _store) = reader_with_books(&["a", "b"]);
    reader.add_tab(BookRecord::new("a", "a.epub", 512), None);
    reader.add_tab(BookRecord::new("b", "b.epub", 512), None);
    assert_eq!(reader.focused_group().unwrap().selected_index(), Some(1));

    let tab = reader.add_tab(BookRecord::new("a", "a.epub", 512), None);
    assert!(tab.is_book());
    let group = reader.focused_group().unwrap();
    assert_eq!(group.len(), 2);
    assert_eq!(group.selected_index(), Some(0));
}

#[test]
fn removing_only_tab_returns_it_and_drops_group() {
    let (mut reader, _store) = reader_with_books(&["a"]);
    reader.add_tab(BookRecord::new("a", "a.epub", 512), None);

    let removed = reader.remove_tab(0, None).unwrap();
    assert_eq!(removed.id(), "a");
    assert!(removed.is_book());
    assert!(reader.groups().is_empty());
    assert_eq!(reader.focused_index(), None);
}

#[test]
fn moved_tab_keeps_its_state() {
    let (mut reader, _store) = reader_with_books(&["a"]);
    reader.add_tab(BookRecord::new("a", "a.epub", 512), None);
    reader.add_tab(UtilityTab::new("library"), None);
    if let Some(tab) = reader.focused_group_mut().and_then(|g| g.tab_mut(0)).and_then(Tab::as_book_mut) {
        tab.define(&["harpoon".to_string()]);
    }

    let tab = reader.remove_tab(0, None).unwrap();
    reader.add_group(vec![TabParam::Tab(tab)], None);

    let moved = reader.focused_book_tab().unwrap();
    assert_eq!(moved.id(), "a");
    assert!(moved.is_defined("harpoon"));
    assert_eq!(reader.groups().len(), 2);
}

#[test]
fn dispatch_routes_events_to_tab() {
    let (mut reader, store) = reader_with_books(&["a", "b"]);
    reader.add_tab(BookRecord::new("a", "a.epub", 512), None);
    reader.add_tab(BookRecord::new("b", "b.epub", 512), None);
    let group_id = reader.focused_group().unwrap().id();

    assert!(reader.dispatch(group_id, "b", EngineEvent::SpineLoaded(moby_sections())));
    assert!(reader.dispatch(group_id, "b", EngineEvent::Relocated(location(2, 1, 1))));
    assert!(!reader.dispatch(group_id, "zzz", EngineEvent::Render));
    assert!(!reader.dispatch(uuid::Uuid::nil(), "b", EngineEvent::Render));

    let b = store.book("b").unwrap();
    assert!((b.percentage - 1.0).abs() < 1e-9);
    assert_eq!(store.book("a").unwrap().percentage, 0.0);
}

#[test]
fn resize_continues_past_failing_tab() {
    let (mut reader, _store) = reader_with_books(&["a", "b"]);
    reader.add_tab(BookRecord::new("a", "a.epub", 512), None);
    reader.add_group(vec![BookRecord::new("b", "b.epub", 512).into()], None);

    let failing = FakeEngine {
        fail_resize: true,
        ..FakeEngine::default()
    };
    let working = FakeEngine::default();
    if let Some(tab) = reader.group_mut(0).and_then(|g| g.tab_mut(0)).and_then(Tab::as_book_mut) {
        tab.render(RenderTarget::new("left"), &failing).unwrap();
    }
    if let Some(tab) = reader.group_mut(1).and_then(|g| g.tab_mut(0)).and_then(Tab::as_book_mut) {
        tab.render(RenderTarget::new("right"), &working).unwrap();
    }

    reader.resize();

    assert!(working.calls().contains(&"resize".to_string()));
    assert!(!failing.calls().contains(&"resize".to_string()));
}

#[test]
fn run_idle_drives_every_tab() {
    let (mut reader, _store) = reader_with_books(&["a", "b"]);
    reader.add_tab(BookRecord::new("a", "a.epub", 512), None);
    reader.add_tab(BookRecord::new("b", "b.epub", 512), None);
    let start = Instant::now();
    for tab in reader.book_tabs_mut() {
        tab.handle_event(EngineEvent::SpineLoaded(moby_sections()));
        tab.set_keyword_at("whale", start);
    }

    assert_eq!(
        reader.next_idle_deadline(),
        Some(start + Duration::from_millis(1000))
    );
    assert_eq!(reader.run_idle(start), 0);
    assert_eq!(reader.run_idle(start + Duration::from_secs(1)), 2);
    assert_eq!(reader.next_idle_deadline(), None);
}

#[test]
fn subscription_sees_changes_from_any_tab() {
    let (mut reader, _store) = reader_with_books(&["a", "b"]);
    let mut updates = reader.subscribe(&[ChangeKind::Definitions]);
    reader.add_tab(BookRecord::new("a", "a.epub", 512), None);
    reader.add_group(vec![BookRecord::new("b", "b.epub", 512).into()], None);

    for tab in reader.book_tabs_mut() {
        tab.define(&["ambergris".to_string()]);
    }

    let mut books = vec![
        updates.try_recv().unwrap().book_id,
        updates.try_recv().unwrap().book_id,
    ];
    books.sort();
    assert_eq!(books, ["a", "b"]);
}

proptest! {
    #[test]
    fn remove_tab_selects_removed_slot(len in 2usize..12, pick in 0usize..12, selected in 0usize..12) {
        let (reader, _store) = reader_with_books(&[]);
        let mut group = utility_group(&reader, len);
        let index = pick % len;
        group.select_tab(selected % len);

        let removed = group.remove_tab(index);

        prop_assert!(removed.is_some());
        prop_assert_eq!(group.len(), len - 1);
        prop_assert_eq!(group.selected_index(), Some(index.min(len - 2)));
    }

    #[test]
    fn remove_group_keeps_focus_in_range(len in 1usize..8, pick in 0usize..8) {
        let (mut reader, _store) = reader_with_books(&[]);
        for i in 0..len {
            reader.add_group(vec![UtilityTab::new(format!("pane-{i}")).into()], None);
        }
        let index = pick % len;

        reader.remove_group(index);

        match reader.focused_index() {
            None => prop_assert!(reader.groups().is_empty()),
            Some(focused) => {
                prop_assert!(focused < reader.groups().len());
                prop_assert_eq!(focused, index.min(len - 2));
            }
        }
    }
}

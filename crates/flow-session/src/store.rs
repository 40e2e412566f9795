//! Local record store collaborator.
//!
//! The session reads document bytes from the store when a tab is first
//! rendered and pushes every record change back to it. Writes are
//! fire-and-forget from the session's side: implementations report their own
//! failures.

use std::cell::RefCell;
use std::collections::HashMap;

use flow_model::{BookChanges, BookRecord};

use crate::engine::DocumentFile;

/// Local persistence for documents and their records.
pub trait RecordStore {
    /// Stored document bytes for `book_id`.
    fn file(&self, book_id: &str) -> Option<DocumentFile>;

    /// Persist a partial change of the record `book_id`.
    fn update(&self, book_id: &str, changes: &BookChanges);
}

/// In-memory [`RecordStore`].
///
/// Keeps the records it was seeded with up to date and journals every
/// update, which makes it the store of choice in tests.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    files: RefCell<HashMap<String, DocumentFile>>,
    books: RefCell<HashMap<String, BookRecord>>,
    journal: RefCell<Vec<(String, BookChanges)>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_file(&self, file: DocumentFile) {
        self.files.borrow_mut().insert(file.book_id.clone(), file);
    }

    pub fn insert_book(&self, book: BookRecord) {
        self.books.borrow_mut().insert(book.id.clone(), book);
    }

    /// Current state of a seeded record.
    pub fn book(&self, book_id: &str) -> Option<BookRecord> {
        self.books.borrow().get(book_id).cloned()
    }

    /// Every update received so far, oldest first.
    pub fn updates(&self) -> Vec<(String, BookChanges)> {
        self.journal.borrow().clone()
    }
}

impl RecordStore for MemoryRecordStore {
    fn file(&self, book_id: &str) -> Option<DocumentFile> {
        self.files.borrow().get(book_id).cloned()
    }

    fn update(&self, book_id: &str, changes: &BookChanges) {
        if let Some(book) = self.books.borrow_mut().get_mut(book_id) {
            book.apply(changes);
        }
        self.journal
            .borrow_mut()
            .push((book_id.to_string(), changes.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_applies_to_seeded_record() {
        let store = MemoryRecordStore::new();
        store.insert_book(BookRecord::new("b1", "a.epub", 1));

        store.update("b1", &BookChanges::definitions(vec!["word".into()]));
        store.update("unknown", &BookChanges::definitions(Vec::new()));

        assert_eq!(store.book("b1").unwrap().definitions, ["word"]);
        assert_eq!(store.updates().len(), 2);
    }

    #[test]
    fn test_file_lookup() {
        let store = MemoryRecordStore::new();
        store.insert_file(DocumentFile::new("b1", vec![1u8, 2, 3]));
        assert_eq!(store.file("b1").unwrap().bytes.len(), 3);
        assert!(store.file("b2").is_none());
    }
}

//! Merge-by-id of local book changes into the remote collection.

use flow_common::SyncSettings;
use flow_model::{BookChanges, BookRecord, BookUpdate, ChangeKind};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::remote::{MutateOptions, RemoteCollection, RemoteStore};

/// Kinds of change that are synced, each as its own merge.
pub const SYNCED_KINDS: [ChangeKind; 4] = [
    ChangeKind::Location,
    ChangeKind::Definitions,
    ChangeKind::Annotations,
    ChangeKind::Configuration,
];

/// Result of one merge.
#[derive(Debug)]
pub enum MergeOutcome {
    /// No remote record has the id (or the collection isn't loaded yet);
    /// nothing was changed or uploaded.
    Missing,
    /// The cache was updated and an upload is running in the background.
    Merged { upload: JoinHandle<()> },
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Pushes local record changes to the remote collection.
pub struct SyncBridge<R> {
    collection: RemoteCollection<R>,
    enabled: bool,
}

impl<R: RemoteStore> SyncBridge<R> {
    pub fn new(collection: RemoteCollection<R>, settings: &SyncSettings) -> Self {
        Self {
            collection,
            enabled: settings.enabled,
        }
    }

    pub fn collection(&self) -> &RemoteCollection<R> {
        &self.collection
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Merge `changes` over the remote record `book_id`.
    ///
    /// The updated collection is uploaded on a spawned task and the cache is
    /// replaced without re-fetching. Must be called within a Tokio runtime.
    pub fn merge(&self, book_id: &str, changes: &BookChanges) -> MergeOutcome {
        let Some(books) = self.collection.update_cache(|books| merged(books, book_id, changes))
        else {
            tracing::debug!(book = book_id, "no remote record to merge into");
            return MergeOutcome::Missing;
        };

        let remote = std::sync::Arc::clone(self.collection.remote());
        let book = book_id.to_string();
        let upload = tokio::spawn(async move {
            match remote.upload(books).await {
                Ok(()) => tracing::debug!(book = %book, "remote collection uploaded"),
                Err(e) => tracing::error!(book = %book, "upload failed: {e}"),
            }
        });
        MergeOutcome::Merged { upload }
    }

    /// Sync one local change notification, one merge per synced kind.
    pub fn sync_update(&self, update: &BookUpdate) -> Vec<MergeOutcome> {
        if !self.enabled {
            return Vec::new();
        }
        update
            .patches()
            .filter(|(kind, _)| SYNCED_KINDS.contains(kind))
            .map(|(kind, patch)| {
                tracing::trace!(book = %update.book_id, ?kind, "merging change");
                self.merge(&update.book_id, &patch)
            })
            .collect()
    }

    /// Load the collection if needed, then sync every update received until
    /// the sending side closes.
    pub async fn run(&self, mut updates: UnboundedReceiver<BookUpdate>) {
        if !self.enabled {
            tracing::info!("sync disabled");
            return;
        }
        if self.collection.snapshot().is_none()
            && let Err(e) = self.collection.load().await
        {
            tracing::warn!("could not load remote collection: {e}");
        }

        while let Some(update) = updates.recv().await {
            let outcomes = self.sync_update(&update);
            if outcomes.iter().all(|o| !o.is_merged()) {
                tracing::debug!(book = %update.book_id, "update not synced");
            }
        }
    }

    /// Re-fetch the remote collection into the cache.
    pub async fn revalidate(&self) -> crate::Result<()> {
        self.collection
            .mutate(|_| None, MutateOptions { revalidate: true })
            .await
            .map(|_| ())
    }
}

/// `books` with `changes` applied to the record `book_id`, or `None` when
/// there is no such record.
fn merged(books: &[BookRecord], book_id: &str, changes: &BookChanges) -> Option<Vec<BookRecord>> {
    let index = books.iter().position(|b| b.id == book_id)?;
    let mut books = books.to_vec();
    books[index].apply(changes);
    Some(books)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_touches_only_matching_record() {
        let books = vec![
            BookRecord::new("a", "a.epub", 1),
            BookRecord::new("b", "b.epub", 2),
        ];
        let out = merged(&books, "b", &BookChanges::location(Some("c".into()), 0.3)).unwrap();
        assert_eq!(out[0], books[0]);
        assert_eq!(out[1].cfi.as_deref(), Some("c"));
        assert_eq!(out[1].name, "b.epub");
    }

    #[test]
    fn test_merged_missing_id() {
        let books = vec![BookRecord::new("a", "a.epub", 1)];
        assert!(merged(&books, "zzz", &BookChanges::definitions(vec![])).is_none());
    }
}

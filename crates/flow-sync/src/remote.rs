//! Remote store contract and the local cache of the remote collection.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flow_model::BookRecord;

use crate::error::{Result, SyncError};

/// Remote holder of the account's book collection.
///
/// The collection is stored and replaced as a whole.
pub trait RemoteStore: Send + Sync + 'static {
    fn fetch_collection(&self) -> impl Future<Output = Result<Vec<BookRecord>>> + Send;

    fn upload(&self, books: Vec<BookRecord>) -> impl Future<Output = Result<()>> + Send;
}

/// Options for [`RemoteCollection::mutate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutateOptions {
    /// Re-fetch from the remote after updating the cache.
    pub revalidate: bool,
}

/// Cached copy of the remote collection, shared by clones.
///
/// Concurrent writers are last-write-wins.
pub struct RemoteCollection<R> {
    remote: Arc<R>,
    cache: Arc<Mutex<Option<Vec<BookRecord>>>>,
}

impl<R> Clone for RemoteCollection<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<R: RemoteStore> RemoteCollection<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote: Arc::new(remote),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Fetch the collection and replace the cache with it.
    pub async fn load(&self) -> Result<Vec<BookRecord>> {
        let books = self.remote.fetch_collection().await?;
        *self.lock() = Some(books.clone());
        tracing::debug!(count = books.len(), "remote collection loaded");
        Ok(books)
    }

    /// Last known collection; `None` before the first load.
    pub fn snapshot(&self) -> Option<Vec<BookRecord>> {
        self.lock().clone()
    }

    /// Replace the cache with whatever `updater` returns for the current
    /// collection. Returning `None` leaves the cache as it is. Returns the
    /// new collection, if any.
    pub fn update_cache<F>(&self, updater: F) -> Option<Vec<BookRecord>>
    where
        F: FnOnce(&[BookRecord]) -> Option<Vec<BookRecord>>,
    {
        let mut cache = self.lock();
        let updated = updater(cache.as_deref()?)?;
        *cache = Some(updated.clone());
        Some(updated)
    }

    /// [`update_cache`](Self::update_cache), then optionally re-fetch.
    pub async fn mutate<F>(&self, updater: F, options: MutateOptions) -> Result<Option<Vec<BookRecord>>>
    where
        F: FnOnce(&[BookRecord]) -> Option<Vec<BookRecord>>,
    {
        let updated = self.update_cache(updater);
        if options.revalidate {
            return self.load().await.map(Some);
        }
        Ok(updated)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Vec<BookRecord>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory [`RemoteStore`] that counts uploads.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    books: Mutex<Vec<BookRecord>>,
    uploads: Mutex<usize>,
    offline: Mutex<bool>,
}

impl MemoryRemote {
    pub fn new(books: Vec<BookRecord>) -> Self {
        Self {
            books: Mutex::new(books),
            ..Self::default()
        }
    }

    pub fn books(&self) -> Vec<BookRecord> {
        self.books.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn upload_count(&self) -> usize {
        *self.uploads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every request fail until switched back.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap_or_else(PoisonError::into_inner) = offline;
    }

    fn check_online(&self) -> Result<()> {
        if *self.offline.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(SyncError::Unavailable {
                message: "remote is offline".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    async fn fetch_collection(&self) -> Result<Vec<BookRecord>> {
        self.check_online()?;
        Ok(self.books())
    }

    async fn upload(&self, books: Vec<BookRecord>) -> Result<()> {
        self.check_online()?;
        *self.books.lock().unwrap_or_else(PoisonError::into_inner) = books;
        *self.uploads.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

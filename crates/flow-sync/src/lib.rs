//! Remote synchronization of book records.
//!
//! Local changes reach the remote collection through [`SyncBridge`], which
//! merges each change into the cached [`RemoteCollection`] by record id and
//! uploads the result in the background. Records are never created remotely
//! by a sync; a change for an id the remote doesn't know is dropped.

pub mod bridge;
pub mod error;
pub mod json_remote;
pub mod remote;

pub use bridge::{MergeOutcome, SYNCED_KINDS, SyncBridge};
pub use error::{Result, SyncError};
pub use json_remote::JsonFileRemote;
pub use remote::{MemoryRemote, MutateOptions, RemoteCollection, RemoteStore};

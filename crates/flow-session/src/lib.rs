//! Reading-session core for Flow.
//!
//! A [`Reader`] holds [`Group`]s of [`Tab`]s; document tabs are [`BookTab`]s,
//! each driving one document through the engine collaborator described in
//! [`engine`]. The core is single-threaded: engine completions come back as
//! [`EngineEvent`]s routed by [`Reader::dispatch`], scheduled searches run
//! from [`Reader::run_idle`], and record changes are published to
//! subscribers of the [`ChangeNotifier`].

pub mod book_tab;
pub mod context;
pub mod engine;
pub mod error;
pub mod group;
pub mod notify;
pub mod reader;
pub mod search;
pub mod store;
pub mod tab;

pub use book_tab::{BookTab, SessionState};
pub use context::{Clock, SessionContext, SystemClock};
pub use engine::{
    Container, ContentView, DocumentEngine, DocumentFile, EngineEvent, EngineHandle,
    RenderOptions, RenderTarget, Renderer, Section, SectionContent, TextRange,
};
pub use error::{EngineError, Result, SessionError};
pub use group::Group;
pub use notify::ChangeNotifier;
pub use reader::Reader;
pub use search::{SearchScheduler, SearchTicket};
pub use store::{MemoryRecordStore, RecordStore};
pub use tab::{Tab, TabParam, UtilityTab};

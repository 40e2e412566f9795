//! Data model for Flow reader sessions.
//!
//! - [`tree`]: generic walkers over nested labeled nodes
//! - [`nav`]: table-of-contents entries and the indexed navigation tree
//! - [`search`]: search hits grouped per section
//! - [`location`]: renderer positions and the visited-location timeline
//! - [`book`]: book/annotation records and partial change sets

pub mod book;
pub mod location;
pub mod nav;
pub mod search;
pub mod tree;

pub use book::{
    AnnotationColor, AnnotationDraft, AnnotationRecord, AnnotationType, BookChanges,
    BookConfiguration, BookMetadata, BookRecord, BookUpdate, ChangeKind, SpineRef, TypographyConfiguration,
    same_definition,
};
pub use location::{DisplayedPage, Location, LocationPoint, TimelineEntry};
pub use nav::{NavItem, NavTree, compare_href};
pub use search::MatchResult;
pub use tree::{TreeNode, depth_first_visit, find, find_mut, flatten};

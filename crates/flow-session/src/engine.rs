//! Contracts of the document engine collaborator.
//!
//! The engine parses and renders documents; the session only drives it.
//! Requests go through [`Renderer`]; completions come back as
//! [`EngineEvent`]s that the host loop hands to
//! [`BookTab::handle_event`](crate::BookTab::handle_event).

use std::fmt;
use std::rc::Rc;

use flow_model::{Location, MatchResult, NavTree};

use crate::error::EngineError;

// =============================================================================
// INPUTS
// =============================================================================

/// Raw document bytes as kept by the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub book_id: String,
    pub bytes: Rc<[u8]>,
}

impl DocumentFile {
    pub fn new(book_id: impl Into<String>, bytes: impl Into<Rc<[u8]>>) -> Self {
        Self {
            book_id: book_id.into(),
            bytes: bytes.into(),
        }
    }
}

/// Identifier of the surface a document is rendered into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderTarget(pub String);

impl RenderTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Options passed to [`EngineHandle::render_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: String,
    pub height: String,
    pub allow_scripted_content: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: "100%".to_string(),
            allow_scripted_content: true,
        }
    }
}

/// Scroll state of the renderer's container.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Container {
    pub scroll_left: f64,
}

/// A text range inside rendered content, as understood by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

// =============================================================================
// ENGINE TRAITS
// =============================================================================

/// Entry point of the engine: opens documents.
pub trait DocumentEngine {
    fn load(&self, file: &DocumentFile) -> Result<Box<dyn EngineHandle>, EngineError>;
}

/// An open document.
///
/// Navigation and spine data arrive later as
/// [`EngineEvent::NavigationLoaded`] and [`EngineEvent::SpineLoaded`].
pub trait EngineHandle {
    fn render_to(
        &mut self,
        target: &RenderTarget,
        options: &RenderOptions,
    ) -> Result<Box<dyn Renderer>, EngineError>;
}

/// Paginated view of an open document.
pub trait Renderer {
    /// Show `target` (a cfi or section href), or the start when `None`.
    fn display(&mut self, target: Option<&str>) -> Result<(), EngineError>;

    fn prev(&mut self) -> Result<(), EngineError>;

    fn next(&mut self) -> Result<(), EngineError>;

    /// Re-fit the rendering surface to its container.
    fn resize(&mut self) -> Result<(), EngineError>;

    /// Current container state, if the renderer has one attached.
    fn container(&self) -> Option<Container>;

    /// First active content view.
    fn first_view(&self) -> Option<Rc<dyn ContentView>>;
}

/// Loaded content of one section.
pub trait SectionContent {
    /// Hits for `keyword`; each hit carries its cfi.
    fn find(&self, keyword: &str) -> Vec<MatchResult>;

    /// Resolve a CSS selector to the cfi of the first matching element.
    ///
    /// `Ok(None)` when nothing matches, `Err` when the selector is invalid.
    fn cfi_from_selector(&self, selector: &str) -> Result<Option<String>, EngineError>;
}

/// A rendered content window.
pub trait ContentView {
    fn range(&self, cfi: &str) -> Option<TextRange>;

    fn cfi_from_range(&self, range: &TextRange) -> Option<String>;
}

// =============================================================================
// SECTIONS AND EVENTS
// =============================================================================

/// One partition of a document's content.
#[derive(Clone)]
pub struct Section {
    /// Position in the spine.
    pub index: usize,
    pub href: String,
    /// Text length of the section, used for progress.
    pub length: usize,
    /// Image sources referenced by the section.
    pub images: Vec<String>,
    /// Id of the matching navigation entry, resolved once navigation loads.
    pub navitem: Option<String>,
    pub content: Rc<dyn SectionContent>,
}

impl Section {
    pub fn new(
        index: usize,
        href: impl Into<String>,
        length: usize,
        content: Rc<dyn SectionContent>,
    ) -> Self {
        Self {
            index,
            href: href.into(),
            length,
            images: Vec::new(),
            navitem: None,
            content,
        }
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("index", &self.index)
            .field("href", &self.href)
            .field("length", &self.length)
            .field("images", &self.images)
            .field("navitem", &self.navitem)
            .finish_non_exhaustive()
    }
}

/// Asynchronous completion reported by the engine.
pub enum EngineEvent {
    /// Table of contents is available.
    NavigationLoaded(NavTree),
    /// Every section is loaded and measured.
    SpineLoaded(Vec<Section>),
    /// The visible range changed.
    Relocated(Location),
    /// A section finished rendering into `view`.
    Rendered {
        section: usize,
        view: Rc<dyn ContentView>,
    },
    /// The render hook fired for a new view.
    Render,
    /// Informational lifecycle notice (attached, started, displayed, ...).
    Lifecycle(&'static str),
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NavigationLoaded(_) => "navigation-loaded",
            Self::SpineLoaded(_) => "spine-loaded",
            Self::Relocated(_) => "relocated",
            Self::Rendered { .. } => "rendered",
            Self::Render => "render",
            Self::Lifecycle(name) => name,
        }
    }
}

impl fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relocated(location) => f.debug_tuple("Relocated").field(location).finish(),
            Self::Rendered { section, .. } => {
                f.debug_struct("Rendered").field("section", section).finish_non_exhaustive()
            }
            Self::SpineLoaded(sections) => f.debug_tuple("SpineLoaded").field(sections).finish(),
            other => f.write_str(other.name()),
        }
    }
}

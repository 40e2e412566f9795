//! Per-document reading session.
//!
//! A [`BookTab`] owns one open document: its engine handle and renderer, the
//! navigation tree and sections once they arrive, the visited-location
//! timeline, search state, and the in-memory [`BookRecord`]. All record
//! mutation goes through [`BookTab::update_book`] so the record store and
//! change subscribers see every change exactly once.

use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use flow_model::{
    AnnotationDraft, AnnotationRecord, BookChanges, BookRecord, Location, LocationPoint,
    MatchResult, NavItem, NavTree, SpineRef, TimelineEntry, find_mut, same_definition,
};

use crate::context::SessionContext;
use crate::engine::{
    Container, ContentView, DocumentEngine, EngineEvent, EngineHandle, RenderOptions,
    RenderTarget, Renderer, Section, TextRange,
};
use crate::error::{EngineError, Result};
use crate::search::SearchScheduler;

// =============================================================================
// SESSION STATE
// =============================================================================

/// Lifecycle of a document session. Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// No engine handle yet.
    #[default]
    Unattached,
    /// Engine handle attached; navigation or sections still outstanding.
    Loading,
    /// Navigation and sections resolved.
    Ready,
    /// A view is attached and tracking location.
    Rendering,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unattached => "unattached",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Rendering => "rendering",
        }
    }
}

// =============================================================================
// BOOK TAB
// =============================================================================

/// A tab showing one document.
pub struct BookTab {
    book: BookRecord,
    ctx: SessionContext,
    state: SessionState,

    // Engine bindings
    handle: Option<Box<dyn EngineHandle>>,
    renderer: Option<Box<dyn Renderer>>,
    target: Option<RenderTarget>,
    content_view: Option<Weak<dyn ContentView>>,
    on_render: Option<Box<dyn FnMut()>>,

    // Document structure
    nav: Option<NavTree>,
    sections: Option<Vec<Section>>,
    /// Spine index of the last rendered section.
    section: Option<usize>,

    // Location
    timeline: Vec<TimelineEntry>,
    location_to_return: Option<Location>,
    rendered: bool,

    // Search
    keyword: String,
    results: Option<Vec<MatchResult>>,
    active_result_id: Option<String>,
    search: SearchScheduler,

    annotation_range: Option<TextRange>,
}

impl BookTab {
    pub fn new(book: BookRecord, ctx: SessionContext) -> Self {
        let debounce = Duration::from_millis(ctx.settings.search.debounce_ms);
        Self {
            book,
            ctx,
            state: SessionState::Unattached,
            handle: None,
            renderer: None,
            target: None,
            content_view: None,
            on_render: None,
            nav: None,
            sections: None,
            section: None,
            timeline: Vec::new(),
            location_to_return: None,
            rendered: false,
            keyword: String::new(),
            results: None,
            active_result_id: None,
            search: SearchScheduler::new(debounce),
            annotation_range: None,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.book.id
    }

    pub fn title(&self) -> &str {
        &self.book.name
    }

    pub fn book(&self) -> &BookRecord {
        &self.book
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether content has been rendered since the last flicker reset.
    pub fn rendered(&self) -> bool {
        self.rendered
    }

    pub fn nav(&self) -> Option<&NavTree> {
        self.nav.as_ref()
    }

    pub fn sections(&self) -> Option<&[Section]> {
        self.sections.as_deref()
    }

    /// Visited locations, most recent first.
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// Current location: the head of the timeline.
    pub fn location(&self) -> Option<&Location> {
        self.timeline.first().map(|entry| &entry.location)
    }

    pub fn current_href(&self) -> Option<&str> {
        self.location().map(|l| l.start.href.as_str())
    }

    /// Section last reported as rendered.
    pub fn current_section(&self) -> Option<&Section> {
        let index = self.section?;
        self.sections.as_ref()?.iter().find(|s| s.index == index)
    }

    pub fn current_nav_item(&self) -> Option<&NavItem> {
        let id = self.current_section()?.navitem.as_deref()?;
        self.nav.as_ref()?.get(id)
    }

    pub fn location_to_return(&self) -> Option<&Location> {
        self.location_to_return.as_ref()
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn results(&self) -> Option<&[MatchResult]> {
        self.results.as_deref()
    }

    pub fn active_result_id(&self) -> Option<&str> {
        self.active_result_id.as_deref()
    }

    pub fn set_active_result(&mut self, id: Option<String>) {
        self.active_result_id = id;
    }

    pub fn annotation_range(&self) -> Option<&TextRange> {
        self.annotation_range.as_ref()
    }

    /// When the pending search becomes runnable, if one is scheduled.
    pub fn next_search_deadline(&self) -> Option<Instant> {
        self.search.next_deadline()
    }

    /// Renderer container, owned by the engine.
    pub fn container(&self) -> Option<Container> {
        self.renderer.as_ref().and_then(|r| r.container())
    }

    /// First active view of the renderer, owned by the engine.
    pub fn view(&self) -> Option<Rc<dyn ContentView>> {
        self.renderer.as_ref().and_then(|r| r.first_view())
    }

    /// Content window of the last rendered section, while the engine keeps
    /// it alive.
    pub fn content_view(&self) -> Option<Rc<dyn ContentView>> {
        self.content_view.as_ref().and_then(Weak::upgrade)
    }

    /// Sum of all section lengths; 0 until sections are resolved.
    pub fn total_length(&self) -> usize {
        self.sections
            .as_ref()
            .map_or(0, |sections| sections.iter().map(|s| s.length).sum())
    }

    /// Hook run whenever the engine renders a new view.
    pub fn set_on_render(&mut self, hook: impl FnMut() + 'static) {
        self.on_render = Some(Box::new(hook));
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    /// Open the document into `target` and show the saved position.
    ///
    /// Rendering into the current target again does nothing, as does a book
    /// whose file is not in the record store. The target is only kept once a
    /// renderer exists, so a failed attempt can be retried.
    pub fn render(&mut self, target: RenderTarget, engine: &dyn DocumentEngine) -> Result<()> {
        if self.renderer.is_some() && self.target.as_ref() == Some(&target) {
            return Ok(());
        }

        let Some(file) = self.ctx.store.file(&self.book.id) else {
            tracing::info!(book = %self.book.id, "no stored file, nothing to render");
            return Ok(());
        };

        let mut handle = engine.load(&file)?;
        let options = RenderOptions {
            allow_scripted_content: self.ctx.settings.render.allow_scripted_content,
            ..RenderOptions::default()
        };
        let renderer = handle.render_to(&target, &options);
        self.handle = Some(handle);
        self.advance_state();

        let mut renderer = renderer?;
        let start = self
            .location()
            .map(|l| l.start.cfi.clone())
            .or_else(|| self.book.cfi.clone());
        if let Err(e) = renderer.display(start.as_deref()) {
            tracing::warn!(book = %self.book.id, "initial display failed: {e}");
        }
        self.renderer = Some(renderer);

        tracing::info!(book = %self.book.id, surface = %target.0, "document opened");
        self.target = Some(target);
        Ok(())
    }

    /// Show `target` (a cfi or href). With `returnable`, the current
    /// location is kept as the place to return to.
    ///
    /// Does nothing until a renderer is attached.
    pub fn display(&mut self, target: Option<&str>, returnable: bool) {
        if self.renderer.is_none() {
            return;
        }
        if returnable {
            self.show_prev_location();
        }
        if let Some(renderer) = self.renderer.as_mut()
            && let Err(e) = renderer.display(target)
        {
            tracing::warn!(book = %self.book.id, "display failed: {e}");
        }
    }

    /// Show the element matched by `selector` in the section at spine
    /// `section_index`, or the start of that section when the selector is
    /// invalid or matches nothing.
    pub fn display_from_selector(&mut self, selector: &str, section_index: usize, returnable: bool) {
        let Some(section) = self
            .sections
            .as_ref()
            .and_then(|sections| sections.iter().find(|s| s.index == section_index))
        else {
            return;
        };

        let target = match section.content.cfi_from_selector(selector) {
            Ok(Some(cfi)) => cfi,
            Ok(None) => {
                tracing::debug!(selector, "selector matched nothing, showing section start");
                section.href.clone()
            }
            Err(e) => {
                tracing::warn!("{e}, showing section start");
                section.href.clone()
            }
        };
        self.display(Some(&target), returnable);
    }

    /// Turn back one page.
    ///
    /// When the container has not scrolled and the current location is not
    /// the start of the content, the engine is about to swap sections; the
    /// rendered flag is cleared so the view re-renders instead of flickering.
    pub fn prev(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if let Err(e) = renderer.prev() {
            tracing::warn!(book = %self.book.id, "prev failed: {e}");
        }

        let unscrolled = self.container().is_some_and(|c| c.scroll_left == 0.0);
        let at_start = self.location().is_some_and(|l| l.at_start);
        if unscrolled && !at_start {
            self.rendered = false;
        }
    }

    /// Turn forward one page.
    pub fn next(&mut self) {
        if let Some(renderer) = self.renderer.as_mut()
            && let Err(e) = renderer.next()
        {
            tracing::warn!(book = %self.book.id, "next failed: {e}");
        }
    }

    /// Re-fit the renderer to its container.
    pub fn resize(&mut self) -> std::result::Result<(), EngineError> {
        match self.renderer.as_mut() {
            Some(renderer) => renderer.resize(),
            None => Ok(()),
        }
    }

    pub fn show_prev_location(&mut self) {
        self.location_to_return = self.location().cloned();
    }

    pub fn hide_prev_location(&mut self) {
        self.location_to_return = None;
    }

    // =========================================================================
    // ENGINE EVENTS
    // =========================================================================

    /// Apply an asynchronous completion from the engine.
    pub fn handle_event(&mut self, event: EngineEvent) {
        tracing::debug!(book = %self.book.id, event = event.name(), "engine event");
        match event {
            EngineEvent::NavigationLoaded(nav) => {
                self.nav = Some(nav);
                self.resolve_section_nav_items();
            }
            EngineEvent::SpineLoaded(sections) => {
                self.sections = Some(sections);
                self.resolve_section_nav_items();
            }
            EngineEvent::Relocated(location) => self.on_relocated(location),
            EngineEvent::Rendered { section, view } => {
                self.section = Some(section);
                self.content_view = Some(Rc::downgrade(&view));
            }
            EngineEvent::Render => {
                if let Some(hook) = self.on_render.as_mut() {
                    hook();
                }
            }
            EngineEvent::Lifecycle(_) => {}
        }
        self.advance_state();
    }

    fn on_relocated(&mut self, location: Location) {
        self.rendered = true;
        let start = location.start.clone();
        self.timeline.insert(
            0,
            TimelineEntry {
                location,
                timestamp: self.ctx.now_millis(),
            },
        );

        if let Some(percentage) = self.progress_at(&start) {
            self.update_book(BookChanges::location(Some(start.cfi), percentage));
        }
    }

    /// Reading progress at `point`, in `[0, 1]`.
    ///
    /// Sections before the current one count in full; the current one counts
    /// by the fraction of its pages shown. `None` until sections are resolved
    /// or when `point` is not in any section.
    pub fn progress_at(&self, point: &LocationPoint) -> Option<f64> {
        let sections = self.sections.as_ref()?;
        let total = self.total_length();
        if total == 0 {
            return None;
        }
        let i = sections.iter().position(|s| s.href == point.href)?;

        let total = total as f64;
        let previous: usize = sections[..i].iter().map(|s| s.length).sum();
        let current = sections[i].length as f64;

        Some(previous as f64 / total + current / total * point.displayed.fraction())
    }

    fn resolve_section_nav_items(&mut self) {
        if let (Some(nav), Some(sections)) = (&self.nav, &mut self.sections) {
            for section in sections.iter_mut() {
                section.navitem = nav.item_for_section(&section.href).map(|i| i.id.clone());
            }
        }
    }

    fn advance_state(&mut self) {
        let next = if self.nav.is_some() && self.sections.is_some() {
            if self.content_view.is_some() {
                SessionState::Rendering
            } else {
                SessionState::Ready
            }
        } else if self.handle.is_some() {
            SessionState::Loading
        } else {
            SessionState::Unattached
        };

        if next > self.state {
            tracing::debug!(
                book = %self.book.id,
                from = self.state.label(),
                to = next.label(),
                "session state"
            );
            self.state = next;
        }
    }

    // =========================================================================
    // RECORD MUTATION
    // =========================================================================

    /// Merge `changes` into the record, persist them and notify subscribers.
    pub fn update_book(&mut self, mut changes: BookChanges) {
        changes.updated_at = Some(self.ctx.now_millis());
        self.book.apply(&changes);
        self.ctx.store.update(&self.book.id, &changes);
        self.ctx.notifier.notify(&self.book, &changes);
    }

    /// Add a highlight, or revise the one already anchored at the same cfi.
    ///
    /// Annotations record the section they were made in, so this needs a
    /// rendered section with a navigation entry; otherwise it does nothing
    /// and returns `None`. Returns the annotation id.
    pub fn put_annotation(&mut self, draft: AnnotationDraft) -> Option<String> {
        let spine = match (self.current_section(), self.current_nav_item()) {
            (Some(section), Some(item)) => SpineRef {
                index: section.index,
                title: item.label.clone(),
            },
            _ => {
                tracing::debug!(book = %self.book.id, "no rendered section to annotate");
                return None;
            }
        };

        let now = self.ctx.now_millis();
        let mut annotations = self.book.annotations.clone();
        let id = match annotations.iter().position(|a| a.cfi == draft.cfi) {
            Some(i) => {
                annotations[i] = annotations[i].revised(draft, now);
                annotations[i].id.clone()
            }
            None => {
                let annotation = AnnotationRecord::create(&self.book.id, spine, draft, now);
                let id = annotation.id.clone();
                annotations.push(annotation);
                id
            }
        };

        self.update_book(BookChanges::annotations(annotations));
        Some(id)
    }

    pub fn remove_annotation(&mut self, cfi: &str) {
        let annotations = self
            .book
            .annotations
            .iter()
            .filter(|a| a.cfi != cfi)
            .cloned()
            .collect();
        self.update_book(BookChanges::annotations(annotations));
    }

    /// Remember the range at `cfi` in the active view for a pending
    /// annotation.
    pub fn set_annotation_range(&mut self, cfi: &str) {
        if let Some(range) = self.view().and_then(|view| view.range(cfi)) {
            self.annotation_range = Some(range);
        }
    }

    pub fn range_to_cfi(&self, range: &TextRange) -> Option<String> {
        self.view()?.cfi_from_range(range)
    }

    pub fn define(&mut self, defs: &[String]) {
        let mut definitions = self.book.definitions.clone();
        definitions.extend_from_slice(defs);
        self.update_book(BookChanges::definitions(definitions));
    }

    pub fn undefine(&mut self, def: &str) {
        let definitions = self
            .book
            .definitions
            .iter()
            .filter(|d| !same_definition(d, def))
            .cloned()
            .collect();
        self.update_book(BookChanges::definitions(definitions));
    }

    pub fn is_defined(&self, def: &str) -> bool {
        self.book.is_defined(def)
    }

    // =========================================================================
    // NAVIGATION TREE
    // =========================================================================

    /// Navigation entries from the top level down to `nav_id`.
    pub fn nav_path(&self, nav_id: &str) -> Vec<&NavItem> {
        self.nav
            .as_ref()
            .map(|nav| nav.path_to(nav_id))
            .unwrap_or_default()
    }

    /// Expand or collapse a table-of-contents entry.
    pub fn toggle(&mut self, id: &str) {
        if let Some(nav) = self.nav.as_mut() {
            nav.toggle(id);
        }
    }

    /// Expand or collapse a search-result node.
    pub fn toggle_result(&mut self, id: &str) {
        if let Some(node) = self.results.as_deref_mut().and_then(|r| find_mut(r, id)) {
            node.expanded = !node.expanded;
        }
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Change the search keyword and schedule a search for it.
    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.set_keyword_at(keyword, Instant::now());
    }

    /// [`set_keyword`](Self::set_keyword) with an explicit clock reading.
    pub fn set_keyword_at(&mut self, keyword: impl Into<String>, now: Instant) {
        let keyword = keyword.into();
        if keyword == self.keyword {
            return;
        }
        self.keyword.clone_from(&keyword);
        self.search.schedule(keyword, now);
    }

    /// Run the scheduled search if its quiet period has passed. Call when the
    /// host loop has nothing else to do. Returns whether a search ran.
    pub fn run_idle(&mut self, now: Instant) -> bool {
        let Some(ticket) = self.search.take_due(now) else {
            return false;
        };
        let results = self.search(&ticket.keyword);
        if self.search.is_current(&ticket) {
            self.results = results;
        } else {
            tracing::trace!(generation = ticket.generation, "discarding stale search");
        }
        true
    }

    /// Search every section for `keyword`.
    ///
    /// Returns `None` for an empty keyword. Otherwise one pre-expanded node
    /// per section with hits, in spine order.
    pub fn search(&self, keyword: &str) -> Option<Vec<MatchResult>> {
        if keyword.is_empty() {
            return None;
        }
        let results = self
            .sections
            .iter()
            .flatten()
            .filter_map(|section| self.search_in_section(keyword, section))
            .collect();
        Some(results)
    }

    /// Hits for `keyword` in one section, grouped under the section's
    /// navigation entry. `None` without hits or without a navigation entry.
    pub fn search_in_section(&self, keyword: &str, section: &Section) -> Option<MatchResult> {
        let hits = section.content.find(keyword);
        if hits.is_empty() {
            return None;
        }

        let nav = self.nav.as_ref()?;
        let item = nav.get(section.navitem.as_deref()?)?;
        let mut path = nav.path_to(&item.id);
        path.pop();
        let description = path
            .iter()
            .map(|i| i.label.as_str())
            .collect::<Vec<_>>()
            .join(" / ");

        let subitems = hits
            .into_iter()
            .map(|hit| MatchResult {
                id: hit.cfi.clone().unwrap_or(hit.id),
                ..hit
            })
            .collect();

        Some(MatchResult {
            id: item.href.clone(),
            excerpt: item.label.clone(),
            description: Some(description),
            expanded: true,
            subitems,
            ..Default::default()
        })
    }
}

impl fmt::Debug for BookTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookTab")
            .field("id", &self.book.id)
            .field("state", &self.state)
            .field("timeline", &self.timeline.len())
            .field("keyword", &self.keyword)
            .finish_non_exhaustive()
    }
}

//! In-memory engine and clock for session tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use flow_common::Settings;
use flow_model::{
    DisplayedPage, Location, LocationPoint, MatchResult, NavItem, NavTree,
};
use flow_session::{
    BookTab, Clock, Container, ContentView, DocumentEngine, DocumentFile, EngineError,
    EngineEvent, EngineHandle, MemoryRecordStore, RenderOptions, RenderTarget, Renderer, Section,
    SectionContent, SessionContext, TextRange,
};

pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Clock that ticks one millisecond per reading.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        let now = self.now.get() + 1;
        self.now.set(now);
        now
    }
}

/// Section content backed by a plain string.
#[derive(Debug, Default)]
pub struct FakeSection {
    pub href: String,
    pub text: String,
    pub selectors: HashMap<String, String>,
}

impl FakeSection {
    pub fn new(href: &str, text: &str) -> Self {
        Self {
            href: href.to_string(),
            text: text.to_string(),
            selectors: HashMap::new(),
        }
    }
}

impl SectionContent for FakeSection {
    fn find(&self, keyword: &str) -> Vec<MatchResult> {
        self.text
            .match_indices(keyword)
            .map(|(offset, hit)| MatchResult::hit(format!("{}!{offset}", self.href), hit))
            .collect()
    }

    fn cfi_from_selector(&self, selector: &str) -> Result<Option<String>, EngineError> {
        if selector.starts_with('!') {
            return Err(EngineError::Selector {
                selector: selector.to_string(),
                message: "unexpected token".to_string(),
            });
        }
        Ok(self.selectors.get(selector).cloned())
    }
}

#[derive(Debug, Default)]
pub struct FakeView;

impl ContentView for FakeView {
    fn range(&self, cfi: &str) -> Option<TextRange> {
        Some(TextRange {
            start: 0,
            end: cfi.len(),
            text: cfi.to_string(),
        })
    }

    fn cfi_from_range(&self, range: &TextRange) -> Option<String> {
        Some(format!("range({}-{})", range.start, range.end))
    }
}

pub struct FakeRenderer {
    log: CallLog,
    scroll_left: Rc<Cell<f64>>,
    fail_resize: bool,
}

impl Renderer for FakeRenderer {
    fn display(&mut self, target: Option<&str>) -> Result<(), EngineError> {
        self.log
            .borrow_mut()
            .push(format!("display {}", target.unwrap_or("<start>")));
        Ok(())
    }

    fn prev(&mut self) -> Result<(), EngineError> {
        self.log.borrow_mut().push("prev".to_string());
        Ok(())
    }

    fn next(&mut self) -> Result<(), EngineError> {
        self.log.borrow_mut().push("next".to_string());
        Ok(())
    }

    fn resize(&mut self) -> Result<(), EngineError> {
        if self.fail_resize {
            return Err(EngineError::render("resize", "surface detached"));
        }
        self.log.borrow_mut().push("resize".to_string());
        Ok(())
    }

    fn container(&self) -> Option<Container> {
        Some(Container {
            scroll_left: self.scroll_left.get(),
        })
    }

    fn first_view(&self) -> Option<Rc<dyn ContentView>> {
        Some(Rc::new(FakeView))
    }
}

struct FakeHandle {
    log: CallLog,
    scroll_left: Rc<Cell<f64>>,
    fail_resize: bool,
}

impl EngineHandle for FakeHandle {
    fn render_to(
        &mut self,
        target: &RenderTarget,
        options: &RenderOptions,
    ) -> Result<Box<dyn Renderer>, EngineError> {
        self.log.borrow_mut().push(format!(
            "render_to {} {}x{}",
            target.0, options.width, options.height
        ));
        Ok(Box::new(FakeRenderer {
            log: Rc::clone(&self.log),
            scroll_left: Rc::clone(&self.scroll_left),
            fail_resize: self.fail_resize,
        }))
    }
}

/// Engine whose renderers record every call in a shared log.
#[derive(Default)]
pub struct FakeEngine {
    pub log: CallLog,
    pub scroll_left: Rc<Cell<f64>>,
    pub fail_load: bool,
    pub fail_resize: bool,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl DocumentEngine for FakeEngine {
    fn load(&self, file: &DocumentFile) -> Result<Box<dyn EngineHandle>, EngineError> {
        if self.fail_load {
            return Err(EngineError::Load {
                message: format!("{} is not a document", file.book_id),
            });
        }
        self.log.borrow_mut().push(format!("load {}", file.book_id));
        Ok(Box::new(FakeHandle {
            log: Rc::clone(&self.log),
            scroll_left: Rc::clone(&self.scroll_left),
            fail_resize: self.fail_resize,
        }))
    }
}

pub fn context(store: Rc<MemoryRecordStore>) -> SessionContext {
    SessionContext::new(store, Settings::default()).with_clock(Rc::new(ManualClock::default()))
}

/// Three chapters nested under one part.
pub fn moby_nav() -> NavTree {
    NavTree::new(vec![
        NavItem::new("part1", "Part One", "Text/part1.xhtml").with_subitems(vec![
            NavItem::new("ch1", "Loomings", "Text/ch1.xhtml"),
            NavItem::new("ch2", "The Carpet-Bag", "Text/ch2.xhtml#start"),
            NavItem::new("ch3", "The Spouter-Inn", "Text/ch3.xhtml"),
        ]),
    ])
}

/// Three sections of 100 characters each.
pub fn moby_sections() -> Vec<Section> {
    let texts = [
        "Call me Ishmael. Some years ago, never mind how long precisely, I thought I would sail.",
        "I stuffed a shirt or two into my old carpet-bag and started for Cape Horn and the Pacific.",
        "Entering that gable-ended Spouter-Inn, you found yourself in the wide, low, straggling entry.",
    ];
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let href = format!("OEBPS/Text/ch{}.xhtml", i + 1);
            let mut content = FakeSection::new(&href, text);
            content
                .selectors
                .insert("#para-2".to_string(), format!("epubcfi(/6/{}!/4/2)", (i + 1) * 2));
            Section::new(i, href, 100, Rc::new(content))
        })
        .collect()
}

pub fn location(index: usize, page: u32, total: u32) -> Location {
    let point = LocationPoint {
        index,
        href: format!("OEBPS/Text/ch{}.xhtml", index + 1),
        cfi: format!("epubcfi(/6/{}!/4/{page})", (index + 1) * 2),
        displayed: DisplayedPage { page, total },
    };
    Location {
        start: point.clone(),
        end: point,
        at_start: index == 0 && page == 1,
        at_end: false,
    }
}

/// Deliver navigation and sections, then render section `section`.
pub fn load_structure(tab: &mut BookTab, section: usize) -> Rc<dyn ContentView> {
    tab.handle_event(EngineEvent::NavigationLoaded(moby_nav()));
    tab.handle_event(EngineEvent::SpineLoaded(moby_sections()));
    let view: Rc<dyn ContentView> = Rc::new(FakeView);
    tab.handle_event(EngineEvent::Rendered {
        section,
        view: Rc::clone(&view),
    });
    view
}

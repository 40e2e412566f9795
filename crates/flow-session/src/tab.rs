//! Tab variants.

use flow_model::BookRecord;

use crate::book_tab::BookTab;
use crate::context::SessionContext;

/// A non-document pane, identified by the panel it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityTab {
    pub panel: String,
}

impl UtilityTab {
    pub fn new(panel: impl Into<String>) -> Self {
        Self {
            panel: panel.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.panel
    }

    pub fn title(&self) -> &str {
        &self.panel
    }
}

/// A tab in a [`Group`](crate::Group).
#[derive(Debug)]
pub enum Tab {
    Book(Box<BookTab>),
    Utility(UtilityTab),
}

impl Tab {
    /// Identity of the tab; two tabs with the same id are the same tab.
    pub fn id(&self) -> &str {
        match self {
            Self::Book(tab) => tab.id(),
            Self::Utility(tab) => tab.id(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Book(tab) => tab.title(),
            Self::Utility(tab) => tab.title(),
        }
    }

    pub fn is_book(&self) -> bool {
        matches!(self, Self::Book(_))
    }

    pub fn is_utility(&self) -> bool {
        matches!(self, Self::Utility(_))
    }

    pub fn as_book(&self) -> Option<&BookTab> {
        match self {
            Self::Book(tab) => Some(&**tab),
            Self::Utility(_) => None,
        }
    }

    pub fn as_book_mut(&mut self) -> Option<&mut BookTab> {
        match self {
            Self::Book(tab) => Some(&mut **tab),
            Self::Utility(_) => None,
        }
    }
}

/// What to open in a group: a record, a utility pane, or an existing tab
/// moved from elsewhere.
#[derive(Debug)]
pub enum TabParam {
    Book(BookRecord),
    Utility(UtilityTab),
    Tab(Tab),
}

impl TabParam {
    /// Identity of the tab this would open, known before constructing it.
    pub fn id(&self) -> &str {
        match self {
            Self::Book(book) => &book.id,
            Self::Utility(tab) => tab.id(),
            Self::Tab(tab) => tab.id(),
        }
    }

    pub fn into_tab(self, ctx: &SessionContext) -> Tab {
        match self {
            Self::Book(book) => Tab::Book(Box::new(BookTab::new(book, ctx.clone()))),
            Self::Utility(tab) => Tab::Utility(tab),
            Self::Tab(tab) => tab,
        }
    }
}

impl From<BookRecord> for TabParam {
    fn from(book: BookRecord) -> Self {
        Self::Book(book)
    }
}

impl From<UtilityTab> for TabParam {
    fn from(tab: UtilityTab) -> Self {
        Self::Utility(tab)
    }
}

impl From<Tab> for TabParam {
    fn from(tab: Tab) -> Self {
        Self::Tab(tab)
    }
}

//! Collaborators shared by every tab of a reader.

use std::fmt;
use std::rc::Rc;

use flow_common::Settings;

use crate::notify::ChangeNotifier;
use crate::store::RecordStore;

/// Source of wall-clock timestamps, in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Everything a tab needs from the application, constructed once at startup
/// and cloned into each [`Group`](crate::Group) and
/// [`BookTab`](crate::BookTab).
#[derive(Clone)]
pub struct SessionContext {
    pub store: Rc<dyn RecordStore>,
    pub clock: Rc<dyn Clock>,
    pub notifier: ChangeNotifier,
    pub settings: Rc<Settings>,
}

impl SessionContext {
    pub fn new(store: Rc<dyn RecordStore>, settings: Settings) -> Self {
        Self {
            store,
            clock: Rc::new(SystemClock),
            notifier: ChangeNotifier::new(),
            settings: Rc::new(settings),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("notifier", &self.notifier)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

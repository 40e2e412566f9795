//! Reading positions reported by the renderer.

use serde::{Deserialize, Serialize};

/// Page counter within the displayed section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedPage {
    /// 1-based page currently shown.
    pub page: u32,
    /// Pages in the section at the current layout.
    pub total: u32,
}

impl DisplayedPage {
    /// Fraction of the section read, `page / total`; 0 when `total` is 0.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.page) / f64::from(self.total)
        }
    }
}

/// One edge of the visible range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    /// Spine index of the section.
    pub index: usize,
    /// Section href.
    pub href: String,
    pub cfi: String,
    pub displayed: DisplayedPage,
}

/// The visible range of a rendered document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub start: LocationPoint,
    pub end: LocationPoint,
    #[serde(default)]
    pub at_start: bool,
    #[serde(default)]
    pub at_end: bool,
}

/// A visited location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub location: Location,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

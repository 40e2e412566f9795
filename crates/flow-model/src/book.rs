//! Book and annotation records shared by the session and the remote store.
//!
//! Field names serialize in camelCase so the remote `data.json` collection
//! stays readable by every client of the same account.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ANNOTATIONS
// =============================================================================

/// Kind of annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    #[default]
    Highlight,
}

/// Highlight color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationColor {
    #[default]
    Yellow,
    Red,
    Green,
    Blue,
}

/// Section an annotation was made in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpineRef {
    pub index: usize,
    /// Label of the section's navigation entry.
    pub title: String,
}

/// A highlight with optional notes, anchored at a cfi.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: String,
    pub book_id: String,
    pub cfi: String,
    pub spine: SpineRef,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    pub color: AnnotationColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub text: String,
}

/// Content of an annotation as supplied by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub kind: AnnotationType,
    pub cfi: String,
    pub color: AnnotationColor,
    pub text: String,
    pub notes: Option<String>,
}

impl AnnotationRecord {
    /// Create a record with a fresh id; both timestamps are `now`.
    pub fn create(book_id: &str, spine: SpineRef, draft: AnnotationDraft, now: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            cfi: draft.cfi,
            spine,
            created_at: now,
            updated_at: now,
            kind: draft.kind,
            color: draft.color,
            notes: draft.notes,
            text: draft.text,
        }
    }

    /// Replace the user-editable fields, keeping id, cfi, spine and
    /// `created_at`.
    #[must_use]
    pub fn revised(&self, draft: AnnotationDraft, now: i64) -> Self {
        Self {
            kind: draft.kind,
            color: draft.color,
            notes: draft.notes,
            text: draft.text,
            updated_at: now,
            ..self.clone()
        }
    }
}

// =============================================================================
// BOOK RECORD
// =============================================================================

/// Per-book typography preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypographyConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_y: Option<f64>,
}

/// Per-book reading configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typography: Option<TypographyConfiguration>,
}

/// Publication metadata captured when the book was imported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

/// A book in the library together with its reading state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    /// File name the book was imported from.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    #[serde(default)]
    pub metadata: BookMetadata,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Last reading position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfi: Option<String>,
    /// Reading progress in `[0, 1]`.
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<AnnotationRecord>,
    #[serde(default)]
    pub configuration: BookConfiguration,
}

impl BookRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    /// Shallow-merge `changes` over this record: every field present in the
    /// change set replaces the current value wholesale.
    pub fn apply(&mut self, changes: &BookChanges) {
        if let Some(name) = &changes.name {
            self.name.clone_from(name);
        }
        if let Some(cfi) = &changes.cfi {
            self.cfi = Some(cfi.clone());
        }
        if let Some(percentage) = changes.percentage {
            self.percentage = percentage;
        }
        if let Some(definitions) = &changes.definitions {
            self.definitions.clone_from(definitions);
        }
        if let Some(annotations) = &changes.annotations {
            self.annotations.clone_from(annotations);
        }
        if let Some(configuration) = &changes.configuration {
            self.configuration.clone_from(configuration);
        }
        if let Some(updated_at) = changes.updated_at {
            self.updated_at = Some(updated_at);
        }
    }

    /// Whether `def` is among the definitions, ignoring case.
    pub fn is_defined(&self, def: &str) -> bool {
        self.definitions.iter().any(|d| same_definition(d, def))
    }

    pub fn annotation(&self, cfi: &str) -> Option<&AnnotationRecord> {
        self.annotations.iter().find(|a| a.cfi == cfi)
    }
}

/// Definitions compare case-insensitively.
pub fn same_definition(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

// =============================================================================
// CHANGE SETS
// =============================================================================

/// Logical group of fields that change (and sync) together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    /// `cfi` and `percentage`.
    Location,
    Definitions,
    Annotations,
    Configuration,
    /// `name`.
    Metadata,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 5] = [
        ChangeKind::Location,
        ChangeKind::Definitions,
        ChangeKind::Annotations,
        ChangeKind::Configuration,
        ChangeKind::Metadata,
    ];
}

/// A partial [`BookRecord`]: only the fields that are `Some` change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<AnnotationRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<BookConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl BookChanges {
    pub fn location(cfi: Option<String>, percentage: f64) -> Self {
        Self {
            cfi,
            percentage: Some(percentage),
            ..Default::default()
        }
    }

    pub fn definitions(definitions: Vec<String>) -> Self {
        Self {
            definitions: Some(definitions),
            ..Default::default()
        }
    }

    pub fn annotations(annotations: Vec<AnnotationRecord>) -> Self {
        Self {
            annotations: Some(annotations),
            ..Default::default()
        }
    }

    pub fn configuration(configuration: BookConfiguration) -> Self {
        Self {
            configuration: Some(configuration),
            ..Default::default()
        }
    }

    /// The slice of `record` that a given kind of change syncs.
    pub fn for_kind(kind: ChangeKind, record: &BookRecord) -> Self {
        match kind {
            ChangeKind::Location => Self::location(record.cfi.clone(), record.percentage),
            ChangeKind::Definitions => Self::definitions(record.definitions.clone()),
            ChangeKind::Annotations => Self::annotations(record.annotations.clone()),
            ChangeKind::Configuration => Self::configuration(record.configuration.clone()),
            ChangeKind::Metadata => Self {
                name: Some(record.name.clone()),
                ..Default::default()
            },
        }
    }

    /// Kinds touched by this change set, in [`ChangeKind::ALL`] order.
    ///
    /// `updated_at` alone does not count as a change.
    pub fn kinds(&self) -> Vec<ChangeKind> {
        ChangeKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                ChangeKind::Location => self.cfi.is_some() || self.percentage.is_some(),
                ChangeKind::Definitions => self.definitions.is_some(),
                ChangeKind::Annotations => self.annotations.is_some(),
                ChangeKind::Configuration => self.configuration.is_some(),
                ChangeKind::Metadata => self.name.is_some(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty() && self.updated_at.is_none()
    }
}

/// Notification that a book record changed locally.
///
/// Carries a snapshot of the record after the change so observers can build
/// whatever slice they care about without reaching back into the session.
#[derive(Debug, Clone, PartialEq)]
pub struct BookUpdate {
    pub book_id: String,
    /// Kinds the receiving subscriber registered for that this change touched.
    pub kinds: Vec<ChangeKind>,
    pub record: BookRecord,
}

impl BookUpdate {
    /// One partial per kind, each ready for a merge-by-id.
    pub fn patches(&self) -> impl Iterator<Item = (ChangeKind, BookChanges)> + '_ {
        self.kinds
            .iter()
            .map(|kind| (*kind, BookChanges::for_kind(*kind, &self.record)))
    }
}

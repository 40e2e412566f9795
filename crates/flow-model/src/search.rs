//! Search hits and their per-section grouping.

use serde::{Deserialize, Serialize};

use crate::tree::TreeNode;

/// A search hit, or a group of hits under one section.
///
/// Leaf hits carry the `cfi` of the matched range and use it as their id.
/// Group nodes are keyed by the section's navigation href and list the
/// enclosing chapter labels in `description`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subitems: Vec<MatchResult>,
}

impl MatchResult {
    /// A leaf hit as reported by the engine; its id is the cfi.
    pub fn hit(cfi: impl Into<String>, excerpt: impl Into<String>) -> Self {
        let cfi = cfi.into();
        Self {
            id: cfi.clone(),
            excerpt: excerpt.into(),
            cfi: Some(cfi),
            ..Default::default()
        }
    }
}

impl TreeNode for MatchResult {
    fn id(&self) -> &str {
        &self.id
    }

    fn expanded(&self) -> bool {
        self.expanded
    }

    fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    fn depth(&self) -> Option<usize> {
        self.depth
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = Some(depth);
    }

    fn subitems(&self) -> &[Self] {
        &self.subitems
    }

    fn subitems_mut(&mut self) -> &mut [Self] {
        &mut self.subitems
    }
}

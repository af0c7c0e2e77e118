//! Content selection - first-match picking over condition-gated entries.
//!
//! Dialogue lines, ambient thoughts, and notices all use the same rule: walk
//! the list in declaration order and take the first entry whose condition
//! holds. Unconditional entries act as fallbacks and belong at the end.

use serde::{Deserialize, Serialize};

use story_world::{Condition, GraphStore, Scene, VariableStore};

/// Anything that can be gated by a condition.
pub trait Conditioned {
    /// The gating condition. `None` means unconditional.
    fn condition(&self) -> Option<&Condition>;
}

impl Conditioned for Condition {
    fn condition(&self) -> Option<&Condition> {
        Some(self)
    }
}

impl Conditioned for Scene {
    fn condition(&self) -> Option<&Condition> {
        Some(&self.condition)
    }
}

/// A piece of authored content with an optional condition.
///
/// Any fields besides `condition` are collected into `content`, so a dialogue
/// line `{"text": "Hello", "condition": {...}}` keeps its `text` untouched.
///
/// `content` is flattened, so only map-shaped `T` (a struct or a JSON object)
/// can be deserialized. Entries over plain values such as `String` can still
/// be built with [`ContentEntry::when`] and [`ContentEntry::fallback`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry<T = serde_json::Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(flatten)]
    pub content: T,
}

impl<T> ContentEntry<T> {
    /// An entry that always matches.
    pub fn fallback(content: T) -> Self {
        Self {
            condition: None,
            content,
        }
    }

    pub fn when(condition: Condition, content: T) -> Self {
        Self {
            condition: Some(condition),
            content,
        }
    }
}

impl<T> Conditioned for ContentEntry<T> {
    fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }
}

/// Return the first entry whose condition matches, or `None`.
pub fn select<'a, T: Conditioned>(
    entries: &'a [T],
    variables: &VariableStore,
    graphs: &GraphStore,
) -> Option<&'a T> {
    entries.iter().find(|entry| {
        entry
            .condition()
            .map_or(true, |c| c.matches(variables, graphs))
    })
}

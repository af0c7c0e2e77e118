//! Time-windowed mood buffer.

use serde::{Deserialize, Serialize};

/// One mood-affecting event and how long ago it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub key: String,
    pub value: f64,
    pub age: f64,
}

/// Recent mood events. Current mood is the sum of their values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodBuffer {
    entries: Vec<MoodEntry>,
}

impl MoodBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh event.
    pub fn push(&mut self, key: impl Into<String>, value: f64) {
        self.entries.push(MoodEntry {
            key: key.into(),
            value,
            age: 0.0,
        });
    }

    /// Age every entry by `dt` and drop those older than `expire_after`.
    pub fn age(&mut self, dt: f64, expire_after: f64) {
        for entry in &mut self.entries {
            entry.age += dt;
        }
        self.entries.retain(|entry| entry.age <= expire_after);
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.value).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoodEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

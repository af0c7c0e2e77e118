//! Authored scenes - condition-gated overrides that cast actors into roles.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// A role an actor plays while a scene is active.
///
/// `action` shares the job id namespace: an action naming a configured job
/// makes the actor perform that job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastEntry {
    pub actor: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl CastEntry {
    pub fn new(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            zone: None,
        }
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }
}

/// A scene. Effects are opaque payloads handed to the host untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub cast: Vec<CastEntry>,
    #[serde(default)]
    pub effects: Vec<serde_json::Value>,
}

impl Scene {
    pub fn new(id: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: id.into(),
            condition,
            cast: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn with_cast(mut self, entry: CastEntry) -> Self {
        self.cast.push(entry);
        self
    }

    pub fn with_effect(mut self, effect: serde_json::Value) -> Self {
        self.effects.push(effect);
        self
    }

    /// The cast entry for an actor, if the actor appears in this scene.
    pub fn role_of(&self, actor: &str) -> Option<&CastEntry> {
        self.cast.iter().find(|c| c.actor == actor)
    }
}

//! Story configuration - the authored input supplied once per lifecycle.
//!
//! Every section is optional. Missing sections switch the corresponding
//! feature off rather than failing: no `needs` or no `jobs` means no actor
//! simulation, an actor without priorities is simply not simulated.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::graph::GraphConfig;
use crate::ordered::OrderedMap;
use crate::scene::Scene;
use crate::value::Value;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse TOML content.
    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A decaying per-actor resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NeedDef {
    #[serde(default)]
    pub label: String,
    /// Amount lost per tick of elapsed time.
    #[serde(default, rename = "decay", alias = "decayPerTick")]
    pub decay_per_tick: f64,
    /// At or below this value the need counts as critical.
    #[serde(default, rename = "critical", alias = "criticalThreshold")]
    pub critical_threshold: f64,
}

impl NeedDef {
    pub fn new(label: impl Into<String>, decay_per_tick: f64, critical_threshold: f64) -> Self {
        Self {
            label: label.into(),
            decay_per_tick,
            critical_threshold,
        }
    }
}

/// A timed behaviour that may restore one need.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobDef {
    #[serde(default)]
    pub label: String,
    #[serde(
        default,
        rename = "fulfills",
        alias = "fulfillsNeed",
        skip_serializing_if = "Option::is_none"
    )]
    pub fulfills_need: Option<String>,
    #[serde(default, rename = "restore", alias = "restoreAmount")]
    pub restore_amount: f64,
    #[serde(default, rename = "duration", alias = "durationTicks")]
    pub duration_ticks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl JobDef {
    pub fn new(label: impl Into<String>, duration_ticks: f64) -> Self {
        Self {
            label: label.into(),
            duration_ticks,
            ..Default::default()
        }
    }

    pub fn fulfilling(mut self, need: impl Into<String>, restore_amount: f64) -> Self {
        self.fulfills_need = Some(need.into());
        self.restore_amount = restore_amount;
        self
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }
}

/// Per-actor simulation settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Job ids in preference order. Empty means the actor is not simulated.
    #[serde(default)]
    pub priorities: Vec<String>,
    /// Starting need values. Needs not listed start full.
    #[serde(default, alias = "initialNeeds")]
    pub needs: OrderedMap<f64>,
}

impl ActorConfig {
    pub fn new<I, S>(priorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priorities: priorities.into_iter().map(Into::into).collect(),
            needs: OrderedMap::new(),
        }
    }

    pub fn with_need(mut self, need: impl Into<String>, value: f64) -> Self {
        self.needs.insert(need, value);
        self
    }
}

/// The complete authored configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoryConfig {
    #[serde(default)]
    pub variables: OrderedMap<Value>,
    #[serde(default)]
    pub graphs: OrderedMap<GraphConfig>,
    #[serde(default)]
    pub actors: OrderedMap<ActorConfig>,
    #[serde(default)]
    pub needs: OrderedMap<NeedDef>,
    #[serde(default)]
    pub jobs: OrderedMap<JobDef>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Mood event key -> mood delta.
    #[serde(default)]
    pub moods: OrderedMap<f64>,
}

impl StoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Convert an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load configuration from a file. `.toml` files are read as TOML, everything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading story configuration");

        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            _ => Self::from_json_str(&source),
        }
    }

    /// Actor simulation runs only when both needs and jobs are configured.
    pub fn simulation_enabled(&self) -> bool {
        !self.needs.is_empty() && !self.jobs.is_empty()
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name, value.into());
        self
    }

    pub fn with_graph(mut self, id: impl Into<String>, graph: GraphConfig) -> Self {
        self.graphs.insert(id, graph);
        self
    }

    pub fn with_actor(mut self, id: impl Into<String>, actor: ActorConfig) -> Self {
        self.actors.insert(id, actor);
        self
    }

    pub fn with_need(mut self, id: impl Into<String>, need: NeedDef) -> Self {
        self.needs.insert(id, need);
        self
    }

    pub fn with_job(mut self, id: impl Into<String>, job: JobDef) -> Self {
        self.jobs.insert(id, job);
        self
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self
    }

    pub fn with_mood(mut self, key: impl Into<String>, delta: f64) -> Self {
        self.moods.insert(key, delta);
        self
    }
}

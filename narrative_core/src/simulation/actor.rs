//! Per-actor simulation state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use story_world::{NeedDef, OrderedMap};

use super::mood::MoodBuffer;

/// Everything the scheduler tracks for one simulated actor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorState {
    /// Need values in need declaration order, each within `[0, ceiling]`.
    pub needs: OrderedMap<f64>,
    /// Current job id. `None` while idle.
    pub job: Option<String>,
    /// Ticks left on the current job.
    pub job_timer: f64,
    pub mood_buffer: MoodBuffer,
    /// Sum of the mood buffer's values.
    pub mood: f64,
    /// Other actor id -> accumulated opinion.
    pub relationships: BTreeMap<String, f64>,
}

impl ActorState {
    /// Fresh state with the given need levels.
    pub fn new(needs: OrderedMap<f64>) -> Self {
        Self {
            needs,
            ..Default::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.job.is_none()
    }

    /// Lower every need by its decay rate, flooring at zero.
    pub fn decay_needs(&mut self, defs: &OrderedMap<NeedDef>, dt: f64, ceiling: f64) {
        for (need, value) in self.needs.iter_mut() {
            if let Some(def) = defs.get(need) {
                *value = bounded(*value - def.decay_per_tick * dt, ceiling);
            }
        }
    }

    /// Raise a need, capping at the ceiling. Unknown needs are ignored.
    pub fn restore_need(&mut self, need: &str, amount: f64, ceiling: f64) {
        if let Some(value) = self.needs.get_mut(need) {
            *value = bounded(*value + amount, ceiling);
        }
    }

    /// The need with the lowest value. Ties go to the earliest declared need.
    pub fn lowest_need(&self) -> Option<(&str, f64)> {
        self.needs.iter().fold(None, |lowest, (need, &value)| match lowest {
            Some((_, best)) if best <= value => lowest,
            _ => Some((need, value)),
        })
    }

    pub fn start_job(&mut self, job: impl Into<String>, duration: f64) {
        self.job = Some(job.into());
        self.job_timer = duration;
    }

    /// Run the current job for `dt`. Returns the job id if it finished.
    pub fn advance_job(&mut self, dt: f64) -> Option<String> {
        self.job.as_ref()?;
        self.job_timer -= dt;
        if self.job_timer > 0.0 {
            return None;
        }
        self.job_timer = 0.0;
        self.job.take()
    }

    /// Add a mood event and refresh the mood total.
    pub fn add_mood(&mut self, key: impl Into<String>, value: f64) {
        self.mood_buffer.push(key, value);
        self.mood = self.mood_buffer.total();
    }

    /// Age mood events, drop expired ones, and refresh the mood total.
    pub fn age_moods(&mut self, dt: f64, expire_after: f64) {
        self.mood_buffer.age(dt, expire_after);
        self.mood = self.mood_buffer.total();
    }

    /// Opinion of another actor. Zero if never adjusted.
    pub fn opinion_of(&self, other: &str) -> f64 {
        self.relationships.get(other).copied().unwrap_or(0.0)
    }

    pub fn adjust_opinion(&mut self, other: impl Into<String>, delta: f64) {
        *self.relationships.entry(other.into()).or_insert(0.0) += delta;
    }
}

/// Keep a need value within `[0, ceiling]`. NaN counts as empty.
pub(crate) fn bounded(value: f64, ceiling: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.min(ceiling).max(0.0)
}

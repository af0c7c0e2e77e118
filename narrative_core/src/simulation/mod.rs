//! Simulation Scheduler - per-actor needs, jobs, mood, and relationships.
//!
//! Each tick processes actors in declaration order:
//! 1. **Decay**: Needs drop by their decay rate times `dt`
//! 2. **Progress**: The current job's timer runs down; a finished job restores its need
//! 3. **Selection**: Idle actors pick a job (scene override first, then needs)
//! 4. **Mood**: Mood events age and expire, mood is re-summed

mod actor;
mod jobs;
mod mood;

pub use actor::*;
pub use jobs::*;
pub use mood::*;

use tracing::{debug, trace};

use story_world::{CastEntry, JobDef, NeedDef, OrderedMap, StoryConfig};

use crate::diagnostics::Warning;
use crate::narrative::EngineConfig;
use actor::bounded;

/// A simulated actor: its preferences and its live state.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedActor {
    /// Known job ids in preference order.
    pub priorities: Vec<String>,
    pub state: ActorState,
}

/// The scheduler for every simulated actor.
#[derive(Debug, Clone)]
pub struct Simulation {
    needs: OrderedMap<NeedDef>,
    jobs: OrderedMap<JobDef>,
    moods: OrderedMap<f64>,
    actors: OrderedMap<SimulatedActor>,
}

impl Simulation {
    /// Build the scheduler, or `None` when needs or jobs are missing.
    ///
    /// Actors without priorities are left out. Unknown job or need references
    /// are dropped and reported through `warnings`, as are non-finite rates,
    /// amounts, and initial values, which are replaced by safe ones.
    pub fn from_config(
        config: &StoryConfig,
        engine: &EngineConfig,
        warnings: &mut Vec<Warning>,
    ) -> Option<Self> {
        if !config.simulation_enabled() {
            return None;
        }

        let mut need_defs = config.needs.clone();
        for (need_id, def) in need_defs.iter_mut() {
            let item = format!("need '{}'", need_id);
            def.decay_per_tick = finite_or(def.decay_per_tick, 0.0, &item, "decay", warnings);
        }

        let mut job_defs = config.jobs.clone();
        for (job_id, def) in job_defs.iter_mut() {
            let item = format!("job '{}'", job_id);
            def.restore_amount = finite_or(def.restore_amount, 0.0, &item, "restore", warnings);
            def.duration_ticks = finite_or(def.duration_ticks, 0.0, &item, "duration", warnings);
        }

        for (job_id, job) in config.jobs.iter() {
            if let Some(need) = &job.fulfills_need {
                if !config.needs.contains_key(need) {
                    warnings.push(Warning::UnknownFulfilledNeed {
                        job: job_id.to_string(),
                        need: need.clone(),
                    });
                }
            }
        }

        let mut actors = OrderedMap::new();
        for (actor_id, actor) in config.actors.iter() {
            if actor.priorities.is_empty() {
                debug!(actor = actor_id, "Actor has no priorities, not simulated");
                continue;
            }

            let mut priorities = Vec::with_capacity(actor.priorities.len());
            for job in &actor.priorities {
                if config.jobs.contains_key(job) {
                    priorities.push(job.clone());
                } else {
                    warnings.push(Warning::UnknownJob {
                        actor: actor_id.to_string(),
                        job: job.clone(),
                    });
                }
            }

            for need in actor.needs.keys() {
                if !config.needs.contains_key(need) {
                    warnings.push(Warning::UnknownNeed {
                        actor: actor_id.to_string(),
                        need: need.to_string(),
                    });
                }
            }

            let ceiling = engine.need_ceiling;
            let item = format!("actor '{}'", actor_id);
            let needs = need_defs.map_values(|need, _| {
                let initial = match actor.needs.get(need) {
                    Some(&value) => {
                        finite_or(value, ceiling, &item, &format!("needs.{}", need), warnings)
                    }
                    None => ceiling,
                };
                bounded(initial, ceiling)
            });

            actors.insert(
                actor_id,
                SimulatedActor {
                    priorities,
                    state: ActorState::new(needs),
                },
            );
        }

        Some(Self {
            needs: need_defs,
            jobs: job_defs,
            moods: config.moods.clone(),
            actors,
        })
    }

    /// Advance every actor by `dt`.
    ///
    /// `role_for` returns the active scene cast entry for an actor, if any.
    pub fn tick<'a>(
        &mut self,
        dt: f64,
        engine: &EngineConfig,
        role_for: impl Fn(&str) -> Option<&'a CastEntry>,
    ) {
        for (actor_id, actor) in self.actors.iter_mut() {
            let state = &mut actor.state;
            state.decay_needs(&self.needs, dt, engine.need_ceiling);

            if let Some(finished) = state.advance_job(dt) {
                if let Some(def) = self.jobs.get(&finished) {
                    if let Some(need) = def.fulfills_need.as_deref() {
                        state.restore_need(need, def.restore_amount, engine.need_ceiling);
                    }
                }
                trace!(actor = actor_id, job = %finished, "Job finished");
            }

            if state.is_idle() {
                let choice = choose_job(
                    actor_id,
                    state,
                    &actor.priorities,
                    &self.needs,
                    &self.jobs,
                    role_for(actor_id),
                    &engine.wander_job,
                );
                if let Some(job) = choice {
                    let duration = self.jobs.get(&job).map_or(0.0, |def| def.duration_ticks);
                    debug!(actor = actor_id, job = %job, duration, "Job assigned");
                    state.start_job(job, duration);
                }
            }

            state.age_moods(dt, engine.mood_expire_ticks);
        }
    }

    pub fn actor_state(&self, actor: &str) -> Option<&ActorState> {
        self.actors.get(actor).map(|a| &a.state)
    }

    pub fn actor(&self, actor: &str) -> Option<&SimulatedActor> {
        self.actors.get(actor)
    }

    /// Simulated actor ids in declaration order.
    pub fn actor_ids(&self) -> impl Iterator<Item = &str> {
        self.actors.keys()
    }

    pub fn job(&self, job: &str) -> Option<&JobDef> {
        self.jobs.get(job)
    }

    /// Copy of every actor's state, for snapshots.
    pub fn states(&self) -> OrderedMap<ActorState> {
        self.actors.map_values(|_, actor| actor.state.clone())
    }

    /// Record a mood event for an actor.
    ///
    /// Returns `Ok(false)` when the actor is not simulated, and a warning when
    /// the key is not in the mood table.
    pub fn add_mood(&mut self, actor: &str, key: &str) -> Result<bool, Warning> {
        let Some(&delta) = self.moods.get(key) else {
            return Err(Warning::UnknownMood {
                actor: actor.to_string(),
                key: key.to_string(),
            });
        };
        match self.actors.get_mut(actor) {
            Some(simulated) => {
                simulated.state.add_mood(key, delta);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Opinion `a` holds of `b`. Zero when `a` is not simulated.
    pub fn opinion(&self, a: &str, b: &str) -> f64 {
        self.actor_state(a).map_or(0.0, |state| state.opinion_of(b))
    }

    /// Adjust the opinion `a` holds of `b`. No-op when `a` is not simulated.
    pub fn set_opinion(&mut self, a: &str, b: &str, delta: f64) {
        if let Some(simulated) = self.actors.get_mut(a) {
            simulated.state.adjust_opinion(b, delta);
        }
    }
}

/// `value` when finite, otherwise `fallback` with a warning.
fn finite_or(
    value: f64,
    fallback: f64,
    item: &str,
    field: &str,
    warnings: &mut Vec<Warning>,
) -> f64 {
    if value.is_finite() {
        return value;
    }
    warnings.push(Warning::NonFiniteValue {
        item: item.to_string(),
        field: field.to_string(),
        value,
        fallback,
    });
    fallback
}

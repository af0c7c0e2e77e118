//! Job selection for idle actors.

use tracing::debug;

use story_world::{CastEntry, JobDef, NeedDef, OrderedMap};

use super::actor::ActorState;

/// Pick the next job for an idle actor.
///
/// # Algorithm
///
/// 1. A cast entry from an active scene overrides everything: its action is
///    used when it names a job, otherwise the wander job when configured,
///    otherwise nothing.
/// 2. Otherwise find the lowest need (ties go to the earliest declared need)
///    and take the first job in `priorities` that fulfills it.
/// 3. With no such job, fall back to the first priority.
///
/// Whether the lowest need is critical is computed and logged, but both cases
/// run the same priority-ordered scan.
pub fn choose_job(
    actor: &str,
    state: &ActorState,
    priorities: &[String],
    needs: &OrderedMap<NeedDef>,
    jobs: &OrderedMap<JobDef>,
    scene_role: Option<&CastEntry>,
    wander_job: &str,
) -> Option<String> {
    if let Some(role) = scene_role {
        if jobs.contains_key(&role.action) {
            return Some(role.action.clone());
        }
        return jobs
            .contains_key(wander_job)
            .then(|| wander_job.to_string());
    }

    if let Some((need, value)) = state.lowest_need() {
        let critical = needs
            .get(need)
            .is_some_and(|def| value <= def.critical_threshold);
        if critical {
            debug!(actor, need, value, "Need is critical");
        }

        let fulfilling = priorities.iter().find(|job| {
            jobs.get(job.as_str())
                .and_then(|def| def.fulfills_need.as_deref())
                == Some(need)
        });
        if let Some(job) = fulfilling {
            return Some(job.clone());
        }
    }

    priorities.first().cloned()
}

//! Diagnostics raised in place of errors.

use story_world::GraphIssue;

/// Something in the configuration or a call did not line up.
///
/// Warnings never interrupt an operation. The service logs them, keeps the
/// most recent ones, and forwards each to the event sink.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Warning {
    #[error("transition requested on unknown graph '{graph}'")]
    UnknownGraph { graph: String },

    #[error("graph '{graph}' has no node '{node}'")]
    UnknownNode { graph: String, node: String },

    #[error("graph '{graph}': no edge from '{from}' to '{to}', transitioning anyway")]
    UndeclaredEdge {
        graph: String,
        from: String,
        to: String,
    },

    #[error("graph '{graph}': {issue}")]
    Graph { graph: String, issue: GraphIssue },

    #[error("actor '{actor}' lists unknown job '{job}'")]
    UnknownJob { actor: String, job: String },

    #[error("actor '{actor}' sets unknown need '{need}'")]
    UnknownNeed { actor: String, need: String },

    #[error("job '{job}' fulfills unknown need '{need}'")]
    UnknownFulfilledNeed { job: String, need: String },

    #[error("unknown mood key '{key}' for actor '{actor}'")]
    UnknownMood { actor: String, key: String },

    #[error("ignoring invalid tick delta {dt}")]
    InvalidDelta { dt: f64 },

    #[error("automatic transitions still firing after {hops} hops")]
    SettleLimit { hops: usize },

    #[error("engine setting {field} = {value} is unusable, using {fallback}")]
    InvalidEngineSetting {
        field: &'static str,
        value: f64,
        fallback: f64,
    },

    #[error("{item}: {field} = {value} is not finite, using {fallback}")]
    NonFiniteValue {
        item: String,
        field: String,
        value: f64,
        fallback: f64,
    },
}

//! Outbound traffic - snapshots, named events, and the bounded event log.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use story_world::{GraphStore, OrderedMap, Value, VariableStore};

use crate::diagnostics::Warning;
use crate::simulation::ActorState;

/// Identifies one `init` lifecycle of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The session of a service that has not been initialised yet.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-capacity FIFO buffer. Pushing past capacity drops the oldest item.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Append an item, evicting from the front to stay within capacity.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Named notifications for observers. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NarrativeEvent {
    #[serde(rename_all = "camelCase")]
    TransitionOccurred {
        graph: String,
        from: Option<String>,
        to: String,
        event: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    VariableChanged {
        name: String,
        value: Value,
        previous: Option<Value>,
        reason: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    TickCompleted { actor_states: OrderedMap<ActorState> },
}

impl NarrativeEvent {
    /// The wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            NarrativeEvent::TransitionOccurred { .. } => "transition-occurred",
            NarrativeEvent::VariableChanged { .. } => "variable-changed",
            NarrativeEvent::TickCompleted { .. } => "tick-completed",
        }
    }
}

/// The full externally visible state, copied out after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session: SessionId,
    pub variables: VariableStore,
    pub graphs: GraphStore,
    /// Event string recorded by the call that produced this snapshot.
    pub event: Option<String>,
    pub actor_states: OrderedMap<ActorState>,
}

impl Snapshot {
    /// Serialize the snapshot for a browser host.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Receiver for everything the service pushes outward.
pub trait EventSink {
    /// Called after every mutating call with a fresh copy of the state.
    fn snapshot(&mut self, snapshot: Snapshot);

    /// Called for each named event.
    fn event(&mut self, event: NarrativeEvent);

    /// Called for each diagnostic warning. Ignored by default.
    fn warning(&mut self, _warning: &Warning) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn snapshot(&mut self, _snapshot: Snapshot) {}

    fn event(&mut self, _event: NarrativeEvent) {}
}

/// Sink that keeps everything it receives, for hosts that poll.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub snapshots: Vec<Snapshot>,
    pub events: Vec<NarrativeEvent>,
    pub warnings: Vec<Warning>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Names of received events, in order.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(NarrativeEvent::name).collect()
    }

    /// Drop everything received so far.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.events.clear();
        self.warnings.clear();
    }
}

impl EventSink for RecordingSink {
    fn snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    fn event(&mut self, event: NarrativeEvent) {
        self.events.push(event);
    }

    fn warning(&mut self, warning: &Warning) {
        self.warnings.push(warning.clone());
    }
}

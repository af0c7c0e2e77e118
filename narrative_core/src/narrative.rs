//! The narrative service - one explicit, host-owned instance per story.
//!
//! The host calls [`Narrative::init`] with a [`StoryConfig`], then drives
//! time with [`Narrative::tick`] and story progress with
//! [`Narrative::transition`] and [`Narrative::set_var`]. Every query is
//! read-only and may be called at any time.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use story_world::{
    CastEntry, Graph, GraphStore, Node, Scene, StoryConfig, Value, VariableStore,
};

use crate::content::{self, Conditioned};
use crate::diagnostics::Warning;
use crate::events::{EventSink, NarrativeEvent, NullSink, RingBuffer, SessionId, Snapshot};
use crate::scenes::SceneResolver;
use crate::simulation::{ActorState, Simulation};

/// Engine tunables. The defaults match the behaviour hosts expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many event strings the log keeps.
    pub event_log_capacity: usize,

    /// How many warnings are kept for inspection.
    pub diagnostics_capacity: usize,

    /// Mood events older than this many ticks expire.
    pub mood_expire_ticks: f64,

    /// Upper bound for every need value.
    pub need_ceiling: f64,

    /// Maximum automatic hops taken by [`Narrative::settle`].
    pub max_auto_hops: usize,

    /// Job used when a scene casts an actor into an action that is not a job.
    pub wander_job: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: 20,
            diagnostics_capacity: 64,
            mood_expire_ticks: 100.0,
            need_ceiling: 100.0,
            max_auto_hops: 16,
            wander_job: "wander".to_string(),
        }
    }
}

impl EngineConfig {
    /// Replace unusable numeric settings with their defaults.
    ///
    /// `need_ceiling` and `mood_expire_ticks` must be finite and not negative.
    pub fn sanitize(&mut self) -> Vec<Warning> {
        let defaults = Self::default();
        let mut warnings = Vec::new();
        for (field, value, fallback) in [
            ("need_ceiling", &mut self.need_ceiling, defaults.need_ceiling),
            (
                "mood_expire_ticks",
                &mut self.mood_expire_ticks,
                defaults.mood_expire_ticks,
            ),
        ] {
            if !value.is_finite() || *value < 0.0 {
                warnings.push(Warning::InvalidEngineSetting {
                    field,
                    value: *value,
                    fallback,
                });
                *value = fallback;
            }
        }
        warnings
    }
}

/// One automatic transition taken because an edge condition held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoHop {
    pub graph: String,
    pub from: String,
    pub to: String,
}

/// The narrative and life-simulation service.
pub struct Narrative<S: EventSink = NullSink> {
    engine: EngineConfig,
    session: SessionId,
    variables: VariableStore,
    graphs: GraphStore,
    scenes: Vec<Scene>,
    simulation: Option<Simulation>,
    events: RingBuffer<String>,
    warnings: RingBuffer<Warning>,
    sink: S,
}

impl Narrative<NullSink> {
    /// Create an uninitialised service that discards its output.
    pub fn new() -> Self {
        Self::with_sink(NullSink)
    }
}

impl Default for Narrative<NullSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> Narrative<S> {
    /// Create an uninitialised service pushing to `sink`.
    pub fn with_sink(sink: S) -> Self {
        Self::with_engine(EngineConfig::default(), sink)
    }

    /// Create an uninitialised service with custom engine settings.
    ///
    /// Unusable numeric settings fall back to their defaults with a warning.
    pub fn with_engine(mut engine: EngineConfig, sink: S) -> Self {
        let issues = engine.sanitize();
        let mut narrative = Self {
            events: RingBuffer::new(engine.event_log_capacity),
            warnings: RingBuffer::new(engine.diagnostics_capacity),
            engine,
            session: SessionId::nil(),
            variables: VariableStore::new(),
            graphs: GraphStore::new(),
            scenes: Vec::new(),
            simulation: None,
            sink,
        };
        for warning in issues {
            narrative.warn(warning);
        }
        narrative
    }

    /// Replace all state with a fresh copy built from `config`.
    ///
    /// Calling this again fully discards the previous state, including the
    /// event log and stored warnings.
    pub fn init(&mut self, config: &StoryConfig) {
        self.session = SessionId::new();
        self.variables = config
            .variables
            .iter()
            .map(|(name, value)| (name, value.clone()))
            .collect();
        self.events = RingBuffer::new(self.engine.event_log_capacity);
        self.warnings = RingBuffer::new(self.engine.diagnostics_capacity);
        self.scenes = config.scenes.clone();

        let mut warnings = Vec::new();
        self.graphs = GraphStore::new();
        for (graph_id, graph_config) in config.graphs.iter() {
            let (graph, issues) = Graph::from_config(graph_config);
            warnings.extend(issues.into_iter().map(|issue| Warning::Graph {
                graph: graph_id.to_string(),
                issue,
            }));
            self.graphs.insert(graph_id, graph);
        }

        self.simulation = Simulation::from_config(config, &self.engine, &mut warnings);
        for warning in warnings {
            self.warn(warning);
        }

        info!(
            session = %self.session,
            graphs = self.graphs.len(),
            actors = self.simulation.as_ref().map_or(0, |s| s.actor_ids().count()),
            scenes = self.scenes.len(),
            "Narrative initialised"
        );
        self.push_snapshot(None);
    }

    /// Move a graph to `node_id`.
    ///
    /// Edges document intended paths but are not enforced: a transition with no
    /// matching edge still happens and only records a warning. Unknown graphs
    /// and nodes are warned about and ignored. Returns whether the graph moved.
    pub fn transition(&mut self, graph_id: &str, node_id: &str, event: Option<&str>) -> bool {
        let (from, undeclared) = match self.graphs.get(graph_id) {
            None => {
                self.warn(Warning::UnknownGraph {
                    graph: graph_id.to_string(),
                });
                return false;
            }
            Some(graph) if !graph.has_node(node_id) => {
                self.warn(Warning::UnknownNode {
                    graph: graph_id.to_string(),
                    node: node_id.to_string(),
                });
                return false;
            }
            Some(graph) => {
                let from = graph.current_node.clone();
                let undeclared = from.as_deref().is_some_and(|current| {
                    let mut outgoing = graph.outgoing(current).peekable();
                    outgoing.peek().is_some() && outgoing.all(|edge| edge.to != node_id)
                });
                (from, undeclared)
            }
        };

        if undeclared {
            self.warn(Warning::UndeclaredEdge {
                graph: graph_id.to_string(),
                from: from.clone().unwrap_or_default(),
                to: node_id.to_string(),
            });
        }

        if let Some(graph) = self.graphs.get_mut(graph_id) {
            graph.set_current(node_id);
        }
        if let Some(event) = event {
            self.events.push(event.to_string());
        }
        debug!(graph = graph_id, from = ?from, to = node_id, "Transition");

        self.sink.event(NarrativeEvent::TransitionOccurred {
            graph: graph_id.to_string(),
            from,
            to: node_id.to_string(),
            event: event.map(str::to_string),
        });
        self.push_snapshot(event.map(str::to_string));
        true
    }

    /// Store a variable, then take at most one automatic transition.
    ///
    /// The event log receives `reason`, or `"name = value"` when no reason is
    /// given. Chained automatic transitions need further calls (or
    /// [`Narrative::settle`]).
    pub fn set_var(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        reason: Option<&str>,
    ) -> Option<AutoHop> {
        let value = value.into();
        let previous = self.variables.set(name, value.clone());
        let entry = reason.map_or_else(|| format!("{} = {}", name, value), str::to_string);
        self.events.push(entry.clone());

        self.sink.event(NarrativeEvent::VariableChanged {
            name: name.to_string(),
            value,
            previous,
            reason: reason.map(str::to_string),
        });
        self.push_snapshot(Some(entry));

        self.step_auto_transition()
    }

    /// Run one automatic evaluation pass.
    ///
    /// Graphs are scanned in declaration order and each graph's edges in array
    /// order. The first edge leaving a graph's current node whose variable
    /// condition holds is taken, and the pass stops there.
    pub fn step_auto_transition(&mut self) -> Option<AutoHop> {
        let hop = self.graphs.iter().find_map(|(graph_id, graph)| {
            let current = graph.current_node.as_deref()?;
            graph
                .outgoing(current)
                .find(|edge| {
                    edge.var_condition()
                        .is_some_and(|c| c.matches(&self.variables, &self.graphs))
                })
                .map(|edge| AutoHop {
                    graph: graph_id.to_string(),
                    from: current.to_string(),
                    to: edge.to.clone(),
                })
        })?;

        debug!(graph = %hop.graph, from = %hop.from, to = %hop.to, "Automatic transition");
        self.transition(&hop.graph, &hop.to, None).then_some(hop)
    }

    /// Keep taking automatic transitions until none fire.
    ///
    /// Bounded by [`EngineConfig::max_auto_hops`]; also stops when a hop lands
    /// on the node it left. Returns the hops taken.
    pub fn settle(&mut self) -> Vec<AutoHop> {
        let mut hops = Vec::new();
        while hops.len() < self.engine.max_auto_hops {
            let Some(hop) = self.step_auto_transition() else {
                return hops;
            };
            let looped = hop.from == hop.to;
            hops.push(hop);
            if looped {
                return hops;
            }
        }

        let limit = self.engine.max_auto_hops;
        self.warn(Warning::SettleLimit { hops: limit });
        hops
    }

    /// Advance the simulation by `dt` ticks.
    ///
    /// Does nothing when simulation is disabled. Negative or non-finite deltas
    /// are treated as zero.
    pub fn tick(&mut self, dt: f64) {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            self.warn(Warning::InvalidDelta { dt });
            0.0
        };

        let Self {
            engine,
            variables,
            graphs,
            scenes,
            simulation,
            ..
        } = self;
        let Some(simulation) = simulation.as_mut() else {
            debug!("Simulation disabled, ignoring tick");
            return;
        };

        let resolver = SceneResolver::new(scenes, variables, graphs);
        simulation.tick(dt, engine, |actor| resolver.action_for(actor));
        let actor_states = simulation.states();
        trace!(dt, "Tick completed");

        self.sink.event(NarrativeEvent::TickCompleted { actor_states });
        self.push_snapshot(None);
    }

    /// Record a mood event for an actor.
    ///
    /// Unknown keys raise a warning; unsimulated actors are ignored.
    pub fn add_mood(&mut self, actor: &str, key: &str) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        if let Err(warning) = simulation.add_mood(actor, key) {
            self.warn(warning);
        }
    }

    /// Opinion actor `a` holds of actor `b`.
    pub fn opinion(&self, a: &str, b: &str) -> f64 {
        self.simulation.as_ref().map_or(0.0, |s| s.opinion(a, b))
    }

    /// Add `delta` to the opinion actor `a` holds of actor `b`.
    pub fn set_opinion(&mut self, a: &str, b: &str, delta: f64) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_opinion(a, b, delta);
        }
    }

    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// The node a graph currently sits on.
    pub fn get_node(&self, graph_id: &str) -> Option<&Node> {
        self.graphs.get(graph_id).and_then(Graph::current)
    }

    /// The event log, oldest first.
    pub fn get_events(&self) -> Vec<&str> {
        self.events.iter().map(String::as_str).collect()
    }

    pub fn get_actor_state(&self, actor: &str) -> Option<&ActorState> {
        self.simulation.as_ref()?.actor_state(actor)
    }

    /// Ids of the active scenes, in declaration order.
    pub fn get_active_scenes(&self) -> Vec<&str> {
        self.scene_resolver().active_ids()
    }

    /// The first cast entry for `actor` across active scenes.
    pub fn get_active_scene_action(&self, actor: &str) -> Option<&CastEntry> {
        self.scene_resolver().action_for(actor)
    }

    /// Effect payloads of every active scene, in declaration order.
    pub fn active_scene_effects(&self) -> Vec<&serde_json::Value> {
        self.scene_resolver().effects()
    }

    /// First entry whose condition matches the current state.
    pub fn select<'a, T: Conditioned>(&self, entries: &'a [T]) -> Option<&'a T> {
        content::select(entries, &self.variables, &self.graphs)
    }

    /// Where an actor should be: its scene role's zone, else its job's zone.
    pub fn actor_zone(&self, actor: &str) -> Option<&str> {
        if let Some(zone) = self
            .get_active_scene_action(actor)
            .and_then(|role| role.zone.as_deref())
        {
            return Some(zone);
        }
        let simulation = self.simulation.as_ref()?;
        let job = simulation.actor_state(actor)?.job.as_deref()?;
        simulation.job(job)?.zone.as_deref()
    }

    pub fn scene_resolver(&self) -> SceneResolver<'_> {
        SceneResolver::new(&self.scenes, &self.variables, &self.graphs)
    }

    pub fn graph(&self, graph_id: &str) -> Option<&Graph> {
        self.graphs.get(graph_id)
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn is_simulating(&self) -> bool {
        self.simulation.is_some()
    }

    /// Simulated actor ids in declaration order.
    pub fn simulated_actors(&self) -> Vec<&str> {
        self.simulation
            .as_ref()
            .map(|s| s.actor_ids().collect())
            .unwrap_or_default()
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Recent warnings, oldest first.
    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    /// A copy of the current state. `event` is the newest log entry.
    pub fn snapshot(&self) -> Snapshot {
        self.build_snapshot(self.events.latest().cloned())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn build_snapshot(&self, event: Option<String>) -> Snapshot {
        Snapshot {
            session: self.session,
            variables: self.variables.clone(),
            graphs: self.graphs.clone(),
            event,
            actor_states: self
                .simulation
                .as_ref()
                .map(Simulation::states)
                .unwrap_or_default(),
        }
    }

    fn push_snapshot(&mut self, event: Option<String>) {
        let snapshot = self.build_snapshot(event);
        self.sink.snapshot(snapshot);
    }

    fn warn(&mut self, warning: Warning) {
        warn!(%warning, "Narrative warning");
        self.sink.warning(&warning);
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentEntry;
    use crate::events::RecordingSink;
    use story_world::{
        ActorConfig, Condition, Edge, GraphConfig, JobDef, NeedDef, VarOp,
    };

    fn story() -> StoryConfig {
        StoryConfig::new()
            .with_variable("gold", 0)
            .with_graph(
                "main",
                GraphConfig::new("intro")
                    .with_node(Node::new("intro"))
                    .with_node(Node::new("middle"))
                    .with_node(Node::new("ending"))
                    .with_edge(Edge::new("intro", "middle"))
                    .with_edge(Edge::new("middle", "ending")),
            )
            .with_graph(
                "quest",
                GraphConfig::new("idle")
                    .with_node(Node::new("idle"))
                    .with_node(Node::new("paid"))
                    .with_node(Node::new("rich"))
                    .with_edge(
                        Edge::new("idle", "paid").when(Condition::var("gold", VarOp::Gte, 5)),
                    )
                    .with_edge(
                        Edge::new("paid", "rich").when(Condition::var("gold", VarOp::Gte, 5)),
                    ),
            )
    }

    fn recording(config: &StoryConfig) -> Narrative<RecordingSink> {
        let mut narrative = Narrative::with_sink(RecordingSink::new());
        narrative.init(config);
        narrative.sink_mut().clear();
        narrative
    }

    #[test]
    fn test_init_places_graphs_at_start() {
        let mut narrative = Narrative::new();
        narrative.init(&story());

        assert_eq!(narrative.get_node("main").map(|n| n.id.as_str()), Some("intro"));
        assert_eq!(narrative.get_node("quest").map(|n| n.id.as_str()), Some("idle"));
        assert!(narrative.get_node("missing").is_none());
        assert_eq!(narrative.get_var("gold"), Some(&Value::from(0)));
        assert!(narrative.get_events().is_empty());
        assert!(!narrative.is_simulating());
    }

    #[test]
    fn test_init_replaces_previous_state() {
        let mut narrative = Narrative::new();
        narrative.init(&story());
        let first_session = narrative.session();
        narrative.set_var("gold", 3, Some("found coins"));
        narrative.transition("main", "middle", None);

        narrative.init(&story());
        assert_ne!(narrative.session(), first_session);
        assert_eq!(narrative.get_var("gold"), Some(&Value::from(0)));
        assert_eq!(narrative.get_node("main").map(|n| n.id.as_str()), Some("intro"));
        assert!(narrative.get_events().is_empty());
    }

    #[test]
    fn test_transition_along_edge() {
        let mut narrative = recording(&story());

        assert!(narrative.transition("main", "middle", Some("left the village")));
        assert_eq!(narrative.get_node("main").map(|n| n.id.as_str()), Some("middle"));
        assert_eq!(narrative.get_events(), vec!["left the village"]);
        assert_eq!(narrative.warnings().count(), 0);

        let sink = narrative.sink();
        assert_eq!(sink.event_names(), vec!["transition-occurred"]);
        assert_eq!(
            sink.events[0],
            NarrativeEvent::TransitionOccurred {
                graph: "main".to_string(),
                from: Some("intro".to_string()),
                to: "middle".to_string(),
                event: Some("left the village".to_string()),
            }
        );
        assert_eq!(sink.snapshots.len(), 1);
        assert_eq!(
            sink.last_snapshot().and_then(|s| s.event.as_deref()),
            Some("left the village")
        );
    }

    #[test]
    fn test_transition_without_edge_warns_but_proceeds() {
        let mut narrative = recording(&story());

        assert!(narrative.transition("main", "ending", None));
        assert_eq!(narrative.get_node("main").map(|n| n.id.as_str()), Some("ending"));
        assert_eq!(
            narrative.warnings().collect::<Vec<_>>(),
            vec![&Warning::UndeclaredEdge {
                graph: "main".to_string(),
                from: "intro".to_string(),
                to: "ending".to_string(),
            }]
        );
        assert_eq!(narrative.sink().warnings.len(), 1);
    }

    #[test]
    fn test_transition_from_node_without_edges_is_silent() {
        let mut narrative = recording(&story());
        narrative.transition("main", "ending", None);
        let before = narrative.warnings().count();

        narrative.transition("main", "intro", None);
        assert_eq!(narrative.warnings().count(), before);
    }

    #[test]
    fn test_transition_on_unknown_graph_or_node_is_a_no_op() {
        let mut narrative = recording(&story());

        assert!(!narrative.transition("side", "anywhere", Some("ignored")));
        assert!(!narrative.transition("main", "nowhere", Some("ignored")));

        assert_eq!(narrative.get_node("main").map(|n| n.id.as_str()), Some("intro"));
        assert!(narrative.get_events().is_empty());
        assert!(narrative.sink().snapshots.is_empty());
        assert_eq!(narrative.warnings().count(), 2);
    }

    #[test]
    fn test_set_var_logs_and_notifies() {
        let mut narrative = recording(&story());

        narrative.set_var("gold", 2, None);
        narrative.set_var("weather", "rain", Some("clouds gathered"));

        assert_eq!(narrative.get_events(), vec!["gold = 2", "clouds gathered"]);
        let sink = narrative.sink();
        assert_eq!(
            sink.events[0],
            NarrativeEvent::VariableChanged {
                name: "gold".to_string(),
                value: Value::from(2),
                previous: Some(Value::from(0)),
                reason: None,
            }
        );
        assert!(matches!(
            &sink.events[1],
            NarrativeEvent::VariableChanged { previous: None, .. }
        ));
        assert_eq!(sink.snapshots.len(), 2);
    }

    #[test]
    fn test_set_var_takes_one_automatic_hop() {
        let mut narrative = recording(&story());

        let hop = narrative.set_var("gold", 10, None);
        assert_eq!(
            hop,
            Some(AutoHop {
                graph: "quest".to_string(),
                from: "idle".to_string(),
                to: "paid".to_string(),
            })
        );
        // paid -> rich also holds, but needs another call
        assert_eq!(narrative.get_node("quest").map(|n| n.id.as_str()), Some("paid"));

        narrative.set_var("gold", 11, None);
        assert_eq!(narrative.get_node("quest").map(|n| n.id.as_str()), Some("rich"));
        assert_eq!(
            narrative.sink().event_names(),
            vec![
                "variable-changed",
                "transition-occurred",
                "variable-changed",
                "transition-occurred",
            ]
        );
    }

    #[test]
    fn test_set_var_without_matching_edge() {
        let mut narrative = recording(&story());
        assert!(narrative.set_var("gold", 1, None).is_none());
        assert_eq!(narrative.get_node("quest").map(|n| n.id.as_str()), Some("idle"));
    }

    #[test]
    fn test_settle_follows_the_chain() {
        let mut narrative = Narrative::new();
        narrative.init(&story());
        narrative.set_var("gold", 10, None);

        let hops = narrative.settle();
        assert_eq!(hops.len(), 1);
        assert_eq!(narrative.get_node("quest").map(|n| n.id.as_str()), Some("rich"));
        assert!(narrative.settle().is_empty());
    }

    #[test]
    fn test_settle_is_bounded() {
        let cycle = StoryConfig::new().with_variable("spin", true).with_graph(
            "wheel",
            GraphConfig::new("a")
                .with_node(Node::new("a"))
                .with_node(Node::new("b"))
                .with_edge(Edge::new("a", "b").when(Condition::var("spin", VarOp::Eq, true)))
                .with_edge(Edge::new("b", "a").when(Condition::var("spin", VarOp::Eq, true))),
        );
        let engine = EngineConfig {
            max_auto_hops: 5,
            ..Default::default()
        };
        let mut narrative = Narrative::with_engine(engine, NullSink);
        narrative.init(&cycle);

        assert_eq!(narrative.settle().len(), 5);
        assert!(narrative
            .warnings()
            .any(|w| *w == Warning::SettleLimit { hops: 5 }));
    }

    #[test]
    fn test_settle_stops_on_self_loop() {
        let looped = StoryConfig::new().with_variable("stay", 1).with_graph(
            "g",
            GraphConfig::new("a")
                .with_node(Node::new("a"))
                .with_edge(Edge::new("a", "a").when(Condition::var("stay", VarOp::Eq, 1))),
        );
        let mut narrative = Narrative::new();
        narrative.init(&looped);

        assert_eq!(narrative.settle().len(), 1);
        assert_eq!(narrative.warnings().count(), 0);
    }

    #[test]
    fn test_event_log_is_bounded() {
        let mut narrative = Narrative::new();
        narrative.init(&story());
        for i in 0..25 {
            narrative.set_var("counter", i, None);
        }

        let events = narrative.get_events();
        assert_eq!(events.len(), 20);
        assert_eq!(events.first(), Some(&"counter = 5"));
        assert_eq!(events.last(), Some(&"counter = 24"));
    }

    #[test]
    fn test_select_uses_live_state() {
        let mut narrative = Narrative::new();
        narrative.init(&story());
        let lines = vec![
            ContentEntry::when(Condition::node("main", "ending"), "Farewell."),
            ContentEntry::when(Condition::var("gold", VarOp::Gte, 5), "Rich already?"),
            ContentEntry::fallback("Hello there."),
        ];

        assert_eq!(narrative.select(&lines).map(|l| l.content), Some("Hello there."));
        narrative.set_var("gold", 7, None);
        assert_eq!(narrative.select(&lines).map(|l| l.content), Some("Rich already?"));
        narrative.transition("main", "ending", None);
        assert_eq!(narrative.select(&lines).map(|l| l.content), Some("Farewell."));
    }

    fn village() -> StoryConfig {
        story()
            .with_need("hunger", NeedDef::new("Hunger", 1.0, 20.0))
            .with_job(
                "eat",
                JobDef::new("Eat", 2.0).fulfilling("hunger", 50.0).in_zone("kitchen"),
            )
            .with_job("wander", JobDef::new("Wander", 1.0))
            .with_actor("mira", ActorConfig::new(["eat"]))
            .with_actor("tom", ActorConfig::new(["eat"]))
            .with_scene(
                story_world::Scene::new("finale", Condition::node("main", "ending"))
                    .with_cast(CastEntry::new("mira", "bow").in_zone("stage"))
                    .with_effect(serde_json::json!({"curtain": "down"})),
            )
            .with_mood("applause", 15.0)
    }

    #[test]
    fn test_tick_pushes_one_snapshot_for_all_actors() {
        let mut narrative = recording(&village());
        narrative.tick(1.0);

        let sink = narrative.sink();
        assert_eq!(sink.event_names(), vec!["tick-completed"]);
        assert_eq!(sink.snapshots.len(), 1);
        let snapshot = sink.last_snapshot().unwrap();
        assert_eq!(snapshot.actor_states.len(), 2);
        assert!(snapshot.event.is_none());
    }

    #[test]
    fn test_tick_without_simulation_does_nothing() {
        let mut narrative = recording(&story());
        narrative.tick(1.0);
        assert!(narrative.sink().snapshots.is_empty());
        assert!(narrative.sink().events.is_empty());
    }

    #[test]
    fn test_negative_delta_is_clamped() {
        let mut narrative = Narrative::new();
        narrative.init(&village());
        narrative.tick(-5.0);

        let state = narrative.get_actor_state("mira").unwrap();
        assert_eq!(state.needs.get("hunger"), Some(&100.0));
        assert!(narrative
            .warnings()
            .any(|w| matches!(w, Warning::InvalidDelta { .. })));
    }

    #[test]
    fn test_scene_overrides_and_zones() {
        let mut narrative = Narrative::new();
        narrative.init(&village());
        narrative.tick(1.0);
        assert_eq!(narrative.actor_zone("mira"), Some("kitchen"));

        // let the first job finish so the next pick sees the scene
        narrative.transition("main", "middle", None);
        narrative.transition("main", "ending", None);
        assert_eq!(narrative.get_active_scenes(), vec!["finale"]);
        assert_eq!(
            narrative.active_scene_effects(),
            vec![&serde_json::json!({"curtain": "down"})]
        );
        narrative.tick(2.0);

        // "bow" is not a job, so mira wanders; tom is not cast and keeps eating
        let mira = narrative.get_actor_state("mira").unwrap();
        assert_eq!(mira.job.as_deref(), Some("wander"));
        assert_eq!(narrative.actor_zone("mira"), Some("stage"));
        assert_eq!(
            narrative.get_actor_state("tom").unwrap().job.as_deref(),
            Some("eat")
        );
        assert_eq!(narrative.actor_zone("tom"), Some("kitchen"));
    }

    #[test]
    fn test_moods_and_opinions_through_service() {
        let mut narrative = Narrative::new();
        narrative.init(&village());

        narrative.add_mood("mira", "applause");
        narrative.add_mood("ghost", "applause");
        narrative.add_mood("mira", "boos");
        assert_eq!(narrative.get_actor_state("mira").unwrap().mood, 15.0);
        assert!(narrative
            .warnings()
            .any(|w| matches!(w, Warning::UnknownMood { key, .. } if key == "boos")));

        narrative.set_opinion("mira", "tom", 2.0);
        narrative.set_opinion("mira", "tom", 3.0);
        narrative.set_opinion("ghost", "tom", 3.0);
        assert_eq!(narrative.opinion("mira", "tom"), 5.0);
        assert_eq!(narrative.opinion("ghost", "tom"), 0.0);
    }

    #[test]
    fn test_engine_config_fills_missing_fields() {
        let engine: EngineConfig =
            serde_json::from_str(r#"{"max_auto_hops": 4, "wander_job": "idle"}"#).unwrap();
        assert_eq!(engine.max_auto_hops, 4);
        assert_eq!(engine.wander_job, "idle");
        assert_eq!(engine.event_log_capacity, 20);
        assert_eq!(engine.mood_expire_ticks, 100.0);
    }

    #[test]
    fn test_unusable_need_ceiling_falls_back() {
        let engine: EngineConfig = serde_json::from_str(r#"{"need_ceiling": -1}"#).unwrap();
        let mut narrative = Narrative::with_engine(engine, RecordingSink::new());

        assert_eq!(narrative.engine().need_ceiling, 100.0);
        assert_eq!(
            narrative.sink().warnings,
            vec![Warning::InvalidEngineSetting {
                field: "need_ceiling",
                value: -1.0,
                fallback: 100.0,
            }]
        );

        narrative.init(&village());
        narrative.tick(1.0);
        let hunger = narrative.get_actor_state("mira").unwrap().needs.get("hunger");
        assert_eq!(hunger, Some(&99.0));
    }

    #[test]
    fn test_nan_engine_settings_fall_back() {
        let engine = EngineConfig {
            need_ceiling: f64::NAN,
            mood_expire_ticks: f64::INFINITY,
            ..Default::default()
        };
        let narrative = Narrative::with_engine(engine, NullSink);

        assert_eq!(narrative.engine(), &EngineConfig::default());
        assert_eq!(narrative.warnings().count(), 2);
    }

    #[test]
    fn test_huge_capacities_do_not_preallocate() {
        let engine = EngineConfig {
            event_log_capacity: usize::MAX,
            diagnostics_capacity: usize::MAX,
            ..Default::default()
        };
        let mut narrative = Narrative::with_engine(engine, NullSink);
        narrative.init(&story());
        narrative.set_var("gold", 1, None);

        assert_eq!(narrative.get_events(), vec!["gold = 1"]);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut narrative = Narrative::new();
        narrative.init(&village());
        let mut snapshot = narrative.snapshot();
        snapshot.variables.set("gold", Value::from(999));

        assert_eq!(narrative.get_var("gold"), Some(&Value::from(0)));
        assert_eq!(narrative.simulated_actors(), vec!["mira", "tom"]);
    }
}

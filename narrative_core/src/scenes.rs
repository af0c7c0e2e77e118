//! Scene resolution - which authored scenes are active and who plays what.

use story_world::{CastEntry, GraphStore, Scene, VariableStore};

/// Read-only view over scenes and the state their conditions look at.
#[derive(Debug, Clone, Copy)]
pub struct SceneResolver<'a> {
    scenes: &'a [Scene],
    variables: &'a VariableStore,
    graphs: &'a GraphStore,
}

impl<'a> SceneResolver<'a> {
    pub fn new(scenes: &'a [Scene], variables: &'a VariableStore, graphs: &'a GraphStore) -> Self {
        Self {
            scenes,
            variables,
            graphs,
        }
    }

    /// Active scenes in declaration order. Several may be active at once.
    pub fn active(&self) -> impl Iterator<Item = &'a Scene> + 'a {
        let (variables, graphs) = (self.variables, self.graphs);
        self.scenes
            .iter()
            .filter(move |scene| scene.condition.matches(variables, graphs))
    }

    /// Ids of the active scenes.
    pub fn active_ids(&self) -> Vec<&'a str> {
        self.active().map(|scene| scene.id.as_str()).collect()
    }

    /// The first cast entry for `actor` across active scenes.
    pub fn action_for(&self, actor: &str) -> Option<&'a CastEntry> {
        self.active().find_map(|scene| scene.role_of(actor))
    }

    /// Effect payloads of all active scenes, in order.
    pub fn effects(&self) -> Vec<&'a serde_json::Value> {
        self.active().flat_map(|scene| scene.effects.iter()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_world::{Condition, Graph, GraphConfig, Node, Value, VarOp};

    fn graphs_at(node: &str) -> GraphStore {
        let config = GraphConfig::new(node)
            .with_node(Node::new("day"))
            .with_node(Node::new("night"));
        let (graph, _) = Graph::from_config(&config);
        let mut store = GraphStore::new();
        store.insert("clock", graph);
        store
    }

    fn scenes() -> Vec<Scene> {
        vec![
            Scene::new("market", Condition::node("clock", "day"))
                .with_cast(CastEntry::new("mira", "sell").in_zone("stall"))
                .with_effect(serde_json::json!({"ambience": "crowd"})),
            Scene::new("storm", Condition::var("rain", VarOp::Gte, 5))
                .with_cast(CastEntry::new("mira", "shelter"))
                .with_cast(CastEntry::new("tom", "shelter"))
                .with_effect(serde_json::json!({"weather": "storm"})),
            Scene::new("tavern", Condition::node("clock", "night"))
                .with_cast(CastEntry::new("tom", "drink")),
        ]
    }

    #[test]
    fn test_active_scenes_in_declaration_order() {
        let scenes = scenes();
        let vars: VariableStore = [("rain", Value::from(7))].into_iter().collect();
        let graphs = graphs_at("day");

        let resolver = SceneResolver::new(&scenes, &vars, &graphs);
        assert_eq!(resolver.active_ids(), vec!["market", "storm"]);
    }

    #[test]
    fn test_first_active_cast_entry_wins() {
        let scenes = scenes();
        let vars: VariableStore = [("rain", Value::from(7))].into_iter().collect();
        let graphs = graphs_at("day");
        let resolver = SceneResolver::new(&scenes, &vars, &graphs);

        assert_eq!(resolver.action_for("mira").map(|c| c.action.as_str()), Some("sell"));
        assert_eq!(resolver.action_for("tom").map(|c| c.action.as_str()), Some("shelter"));
        assert!(resolver.action_for("nobody").is_none());
    }

    #[test]
    fn test_inactive_scenes_are_skipped() {
        let scenes = scenes();
        let vars = VariableStore::new();
        let graphs = graphs_at("night");
        let resolver = SceneResolver::new(&scenes, &vars, &graphs);

        assert_eq!(resolver.active_ids(), vec!["tavern"]);
        assert!(resolver.action_for("mira").is_none());
        assert!(resolver.effects().is_empty());
    }

    #[test]
    fn test_effects_follow_active_scenes() {
        let scenes = scenes();
        let vars: VariableStore = [("rain", Value::from(9))].into_iter().collect();
        let graphs = graphs_at("night");
        let resolver = SceneResolver::new(&scenes, &vars, &graphs);

        assert_eq!(
            resolver.effects(),
            vec![&serde_json::json!({"weather": "storm"})]
        );
    }
}

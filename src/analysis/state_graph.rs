use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use indexmap::map::Entry;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::{EdgeReference, StableGraph};
use serde::Serialize;

use crate::net::model::NetModel;
use crate::net::structure::{Marking, Weight};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenChange {
    pub place: String,
    pub before: Weight,
    pub after: Weight,
    pub delta: i64,
}

impl TokenChange {
    fn between(before: &Marking, after: &Marking) -> Vec<Self> {
        after
            .iter()
            .filter_map(|(place, after_tokens)| {
                let before_tokens = before.tokens(place).unwrap_or(0);
                (before_tokens != after_tokens).then(|| Self {
                    place: place.to_owned(),
                    before: before_tokens,
                    after: after_tokens,
                    delta: after_tokens as i64 - before_tokens as i64,
                })
            })
            .collect()
    }
}

/// marking is the full state; enabled is filled once the node is expanded.
#[derive(Debug, Clone)]
pub struct StateNode {
    pub index: usize,
    pub marking: Marking,
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StateEdge {
    pub transition: String,
    pub changes: Vec<TokenChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateGraphStats {
    pub state_count: usize,
    pub edge_count: usize,
    pub dead_count: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StateGraphConfig {
    /// Upper bound on stored states. `None` explores until exhaustion, which
    /// always terminates because every place is bounded by the token cap.
    pub state_limit: Option<usize>,
}

/// Complete breadth-first reachability graph.
///
/// Unlike [`NetModel::reachable_markings`], every discovered marking is
/// expanded, so the node set is the full reachability set (up to
/// `state_limit`).
#[derive(Debug)]
pub struct StateGraph {
    pub graph: StableGraph<StateNode, StateEdge>,
    pub initial: NodeIndex,
    pub dead: Vec<NodeIndex>,
    pub truncated: bool,
    pub markings: IndexMap<Marking, NodeIndex>,
}

impl StateGraph {
    pub fn dot(&self) -> String {
        fn escape(s: &str) -> String {
            s.replace('\\', "\\\\").replace('"', "\\\"")
        }

        let mut edge_attr = |_, edge: EdgeReference<StateEdge>| -> String {
            format!("label=\"{}\"", escape(&edge.weight().transition))
        };

        let mut node_attr = |_, (_idx, node): (NodeIndex, &StateNode)| -> String {
            let mut label = format!("s{}\\n{}", node.index, escape(&node.marking.to_string()));
            if !node.enabled.is_empty() {
                label.push_str(&format!("\\nenabled: {}", escape(&node.enabled.join(", "))));
            }
            format!("label=\"{}\"", label)
        };

        format!(
            "{:?}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &mut edge_attr,
                &mut node_attr
            )
        )
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.dot())
    }

    pub fn from_model(model: &NetModel) -> Self {
        Self::with_config(model, StateGraphConfig::default())
    }

    pub fn with_config(model: &NetModel, config: StateGraphConfig) -> Self {
        let mut graph = StableGraph::new();
        let mut markings: IndexMap<Marking, NodeIndex> = IndexMap::new();
        let mut queue = VecDeque::new();
        let mut dead = Vec::new();
        let mut truncated = false;

        let initial_marking = model.marking();
        let initial = graph.add_node(StateNode {
            index: 0,
            marking: initial_marking.clone(),
            enabled: Vec::new(),
        });
        markings.insert(initial_marking, initial);
        queue.push_back((initial, model.clone()));

        while let Some((state, current)) = queue.pop_front() {
            let enabled = current.enabled_indices();
            graph[state].enabled = enabled
                .iter()
                .map(|&t| current.transition_at(t).id.clone())
                .collect();
            if enabled.is_empty() {
                dead.push(state);
                continue;
            }

            let current_marking = graph[state].marking.clone();
            for t in enabled {
                let next = current.fire_at(t);
                let next_marking = next.marking();
                let target = match markings.entry(next_marking.clone()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        if config
                            .state_limit
                            .is_some_and(|limit| graph.node_count() >= limit)
                        {
                            truncated = true;
                            continue;
                        }
                        let index = graph.add_node(StateNode {
                            index: graph.node_count(),
                            marking: next_marking.clone(),
                            enabled: Vec::new(),
                        });
                        entry.insert(index);
                        queue.push_back((index, next));
                        index
                    }
                };
                graph.add_edge(
                    state,
                    target,
                    StateEdge {
                        transition: current.transition_at(t).id.clone(),
                        changes: TokenChange::between(&current_marking, &next_marking),
                    },
                );
            }
        }

        Self {
            graph,
            initial,
            dead,
            truncated,
            markings,
        }
    }

    pub fn stats(&self) -> StateGraphStats {
        StateGraphStats {
            state_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            dead_count: self.dead.len(),
            truncated: self.truncated,
        }
    }

    pub fn node(&self, index: NodeIndex) -> &StateNode {
        &self.graph[index]
    }

    pub fn contains_marking(&self, marking: &Marking) -> bool {
        self.markings.contains_key(marking)
    }

    /// Markings in BFS discovery order.
    pub fn reachable_set(&self) -> impl Iterator<Item = &Marking> {
        self.markings.keys()
    }
}

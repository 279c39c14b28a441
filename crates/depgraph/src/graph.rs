//! Conformance chain traversal using petgraph.
//!
//! The index stores only direct edges (`A: B`). Chains like `A: B`, `B: C`
//! are walked here, at query time, with a breadth-first search:
//!
//! - [`ConformanceGraph::supertypes`]: everything a type conforms to or inherits from
//! - [`ConformanceGraph::subtypes`]: everything that conforms to or inherits from a type
//!
//! Edges point from subtype to supertype. Types are identified by name, so
//! two same-named types in different files share a node.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use crate::index::Index;

/// A type reached by walking conformance edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceHop {
    /// Type name
    pub name: String,
    /// Number of edges from the starting type (1 = direct)
    pub depth: usize,
}

/// Directed graph of conformance edges, built from an [`Index`].
#[derive(Debug, Default)]
pub struct ConformanceGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl ConformanceGraph {
    /// Build the graph from every conformance edge in `index`.
    #[must_use]
    pub fn from_index(index: &Index) -> Self {
        let mut this = Self::default();
        for edge in index.conformances() {
            let from = this.node(&edge.subtype);
            let to = this.node(&edge.supertype);
            if this.graph.find_edge(from, to).is_none() {
                this.graph.add_edge(from, to, ());
            }
        }
        this
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Whether `name` appears on either end of any edge.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// All supertypes and protocols of `name`, transitively.
    ///
    /// Sorted by depth, then name. Unknown names yield an empty list.
    #[must_use]
    pub fn supertypes(&self, name: &str) -> Vec<ConformanceHop> {
        self.walk(name, Direction::Outgoing)
    }

    /// All types conforming to or inheriting from `name`, transitively.
    ///
    /// Sorted by depth, then name. Unknown names yield an empty list.
    #[must_use]
    pub fn subtypes(&self, name: &str) -> Vec<ConformanceHop> {
        self.walk(name, Direction::Incoming)
    }

    fn walk(&self, name: &str, direction: Direction) -> Vec<ConformanceHop> {
        let Some(&start) = self.nodes.get(name) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        let mut visited = HashSet::from([start]);
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            for edge in self.graph.edges_directed(current, direction) {
                let next = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                if visited.insert(next) {
                    queue.push_back((next, depth + 1));
                    result.push(ConformanceHop {
                        name: self.graph[next].clone(),
                        depth: depth + 1,
                    });
                }
            }
        }

        result.sort_by(|a, b| (a.depth, &a.name).cmp(&(b.depth, &b.name)));
        result
    }
}

//! Social graph store.
//!
//! An undirected simple graph over agent identifiers, backed by a petgraph
//! [`UnGraph`]. Nodes are created once (one per agent, in id order) and never
//! removed, so `NodeIndex::new(id)` always addresses agent `id`.
//!
//! Mutations are idempotent: adding a self-loop, a duplicate edge, or an edge
//! to an unknown node is a no-op, as is removing an edge that does not exist.
//! This lets rewiring code attempt the same change from both endpoints
//! without coordinating.

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::Rng;

use crate::agent::AgentId;

/// Undirected simple graph keyed by [`AgentId`].
#[derive(Debug, Clone)]
pub struct SocialGraph {
    graph: UnGraph<AgentId, ()>,
    nodes: Vec<NodeIndex>,
}

impl SocialGraph {
    /// Create an edgeless graph with `n` nodes, ids `0..n`.
    pub fn with_agents(n: usize) -> Self {
        let mut graph = UnGraph::with_capacity(n, 0);
        let nodes = (0..n).map(|i| graph.add_node(AgentId(i))).collect();
        Self { graph, nodes }
    }

    /// Erdős–Rényi G(n, p) graph with `p = avg_degree / (n - 1)`.
    ///
    /// Every unordered pair is tested once, in lexicographic order, against a
    /// single uniform draw from `rng`.
    pub fn erdos_renyi(n: usize, avg_degree: f64, rng: &mut impl Rng) -> Self {
        let mut store = Self::with_agents(n);
        if n < 2 {
            return store;
        }

        let p = avg_degree / (n - 1) as f64;
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.gen::<f64>() < p {
                    store
                        .graph
                        .add_edge(store.nodes[i], store.nodes[j], ());
                }
            }
        }

        store
    }

    fn index(&self, id: AgentId) -> Option<NodeIndex> {
        self.nodes.get(id.0).copied()
    }

    /// Number of nodes (agents).
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `a` and `b` are connected.
    pub fn has_edge(&self, a: AgentId, b: AgentId) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(x), Some(y)) => self.graph.contains_edge(x, y),
            _ => false,
        }
    }

    /// Connect `a` and `b`. Returns `true` if a new edge was created.
    ///
    /// Self-loops, duplicates and unknown endpoints are ignored.
    pub fn add_edge(&mut self, a: AgentId, b: AgentId) -> bool {
        if a == b {
            return false;
        }
        let (Some(x), Some(y)) = (self.index(a), self.index(b)) else {
            return false;
        };
        if self.graph.contains_edge(x, y) {
            return false;
        }
        self.graph.add_edge(x, y, ());
        true
    }

    /// Disconnect `a` and `b`. Returns `true` if an edge was removed.
    pub fn remove_edge(&mut self, a: AgentId, b: AgentId) -> bool {
        let (Some(x), Some(y)) = (self.index(a), self.index(b)) else {
            return false;
        };
        match self.graph.find_edge(x, y) {
            Some(edge) => {
                self.graph.remove_edge(edge);
                true
            },
            None => false,
        }
    }

    /// Current neighbors of `id`, in the graph's iteration order.
    ///
    /// Unknown ids have no neighbors.
    pub fn neighbors(&self, id: AgentId) -> Vec<AgentId> {
        match self.index(id) {
            Some(node) => self.graph.neighbors(node).map(|n| self.graph[n]).collect(),
            None => Vec::new(),
        }
    }

    /// Degree of `id` (0 for unknown ids).
    pub fn degree(&self, id: AgentId) -> usize {
        match self.index(id) {
            Some(node) => self.graph.neighbors(node).count(),
            None => 0,
        }
    }

    /// All edges as `(low, high)` id pairs, in storage order.
    pub fn edges(&self) -> Vec<(AgentId, AgentId)> {
        self.graph
            .edge_references()
            .map(|e| {
                let (a, b) = (self.graph[e.source()], self.graph[e.target()]);
                if a < b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect()
    }

    /// Number of connected components. Isolated nodes count as their own
    /// component; an empty graph has none.
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Check the simple-graph invariant: no self-loops, no parallel edges.
    pub fn is_simple(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.edges().into_iter().all(|(a, b)| a != b && seen.insert((a, b)))
    }
}

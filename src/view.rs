//! Read-only rendering surface for visualizers.
//!
//! A [`GraphView`] is a detached copy of the nodes, edges and opinions at one
//! instant; mutating it never touches the model. It serializes to JSON via
//! serde and renders to Graphviz DOT with nodes colored by opinion side
//! (red positive, grey neutral, green negative).

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, OpinionState};
use crate::error::Result;
use crate::graph::SocialGraph;

/// One node of a [`GraphView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    /// Agent id
    pub id: usize,
    /// Opinion at capture time
    pub opinion: f64,
    /// Agent tolerance
    pub tolerance: f64,
}

impl NodeView {
    /// Fill color by opinion side.
    pub fn color(&self) -> &'static str {
        match OpinionState::of_opinion(self.opinion) {
            OpinionState::Positive => "#FF0000",
            OpinionState::Neutral => "#808080",
            OpinionState::Negative => "#008000",
        }
    }
}

/// One undirected edge of a [`GraphView`], `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    /// Lower endpoint id
    pub source: usize,
    /// Higher endpoint id
    pub target: usize,
}

/// Nodes, edges and per-node opinions at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    /// Nodes in id order
    pub nodes: Vec<NodeView>,
    /// Edges sorted by `(source, target)`
    pub edges: Vec<EdgeView>,
}

impl GraphView {
    /// Copy the current state of `graph` and `agents`.
    pub fn capture(graph: &SocialGraph, agents: &[Agent]) -> Self {
        let nodes = agents
            .iter()
            .map(|a| NodeView {
                id: a.id().0,
                opinion: a.opinion(),
                tolerance: a.tolerance(),
            })
            .collect();
        let mut edges: Vec<EdgeView> = graph
            .edges()
            .into_iter()
            .map(|(a, b)| EdgeView {
                source: a.0,
                target: b.0,
            })
            .collect();
        edges.sort_by_key(|e| (e.source, e.target));
        Self { nodes, edges }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Graphviz DOT (undirected).
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        dot.push_str("graph EchoChamber {\n");
        dot.push_str("  node [shape=circle style=filled];\n\n");

        for node in &self.nodes {
            dot.push_str(&format!(
                "  {} [label=\"{}\\n{:.2}\" fillcolor=\"{}\" \
                 tooltip=\"Opinion: {:.2} Tolerance: {:.2}\"];\n",
                node.id,
                node.id,
                node.opinion,
                node.color(),
                node.opinion,
                node.tolerance
            ));
        }

        dot.push('\n');
        for edge in &self.edges {
            dot.push_str(&format!(
                "  {} -- {} [color=\"#e8e8e8\"];\n",
                edge.source, edge.target
            ));
        }

        dot.push_str("}\n");
        dot
    }
}

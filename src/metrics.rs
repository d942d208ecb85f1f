//! Echo-chamber metrics.
//!
//! Every metric reads the graph and population without mutating them and
//! falls back to `0` where its denominator would be empty: no edges for
//! homophily and modularity, fewer than two (similar) neighbors for an
//! agent's clustering coefficient, no agents for the averages.
//!
//! | Metric                 | Range      | Meaning                                |
//! |------------------------|------------|----------------------------------------|
//! | `num_clusters`         | 0..=n      | connected components                   |
//! | `opinion_homophily`    | [0, 1]     | edges joining same-state agents        |
//! | `opinion_modularity`   | [-0.5, 1)  | partition quality of the opinion sides |
//! | `opinion_clustering`   | [0, 1]     | triangle density among similar peers   |
//! | `radicalization`       | [0, 0.5]   | mean distance from neutral             |

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, OpinionState, NEUTRAL};
use crate::graph::SocialGraph;

/// Metrics recorded for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Step index (0 is the initial state)
    pub step: u64,
    /// Number of connected components
    pub num_clusters: usize,
    /// Average opinion clustering coefficient
    pub opinion_clustering_coefficient: f64,
    /// Fraction of edges joining agents in the same opinion state
    pub opinion_homophily: f64,
    /// Modularity of the negative / neutral / positive partition
    pub opinion_modularity: f64,
    /// Mean distance from neutral; recorded in radical mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radicalization: Option<f64>,
}

impl MetricsSnapshot {
    /// Compute all metrics for the current state.
    pub fn capture(step: u64, graph: &SocialGraph, agents: &[Agent], radical: bool) -> Self {
        Self {
            step,
            num_clusters: cluster_count(graph),
            opinion_clustering_coefficient: opinion_clustering_coefficient(graph, agents),
            opinion_homophily: opinion_homophily(graph, agents),
            opinion_modularity: opinion_modularity(graph, agents),
            radicalization: radical.then(|| radicalization(agents)),
        }
    }
}

/// Number of connected components, isolated agents included.
pub fn cluster_count(graph: &SocialGraph) -> usize {
    graph.component_count()
}

fn neighbor_opinions(graph: &SocialGraph, agents: &[Agent], id: AgentId) -> Vec<f64> {
    graph
        .neighbors(id)
        .into_iter()
        .map(|n| agents[n.0].opinion())
        .collect()
}

/// Homophily state of every agent, indexed by id.
pub fn opinion_states(graph: &SocialGraph, agents: &[Agent]) -> Vec<OpinionState> {
    agents
        .iter()
        .map(|a| OpinionState::of_agent(a.opinion(), &neighbor_opinions(graph, agents, a.id())))
        .collect()
}

/// Fraction of edges whose endpoints share an opinion state; 0 without edges.
pub fn opinion_homophily(graph: &SocialGraph, agents: &[Agent]) -> f64 {
    let edges = graph.edges();
    if edges.is_empty() {
        return 0.0;
    }

    let states = opinion_states(graph, agents);
    let same = edges
        .iter()
        .filter(|(a, b)| states[a.0] == states[b.0])
        .count();
    same as f64 / edges.len() as f64
}

fn community(opinion: f64) -> usize {
    match OpinionState::of_opinion(opinion) {
        OpinionState::Negative => 0,
        OpinionState::Positive => 1,
        OpinionState::Neutral => 2,
    }
}

/// Newman modularity of the partition into negative, positive and neutral
/// agents; 0 without edges.
///
/// `Q = sum_c [ L_c / m - (d_c / 2m)^2 ]` with `L_c` the edges inside
/// community `c` and `d_c` the total degree of its members.
pub fn opinion_modularity(graph: &SocialGraph, agents: &[Agent]) -> f64 {
    let edges = graph.edges();
    if edges.is_empty() {
        return 0.0;
    }

    let m = edges.len() as f64;
    let mut internal = [0usize; 3];
    let mut degree = [0usize; 3];
    for (a, b) in &edges {
        let (ca, cb) = (
            community(agents[a.0].opinion()),
            community(agents[b.0].opinion()),
        );
        degree[ca] += 1;
        degree[cb] += 1;
        if ca == cb {
            internal[ca] += 1;
        }
    }

    internal
        .iter()
        .zip(degree.iter())
        .map(|(&l, &d)| l as f64 / m - (d as f64 / (2.0 * m)).powi(2))
        .sum()
}

/// One agent's opinion clustering coefficient.
///
/// Similar neighbors are those with `|diff| < tolerance`. The coefficient is
/// the fraction of similar-neighbor pairs that are themselves connected; 0
/// for agents with fewer than two neighbors or two similar neighbors.
pub fn agent_clustering_coefficient(graph: &SocialGraph, agents: &[Agent], id: AgentId) -> f64 {
    let agent = &agents[id.0];
    let neighbors = graph.neighbors(id);
    if neighbors.len() < 2 {
        return 0.0;
    }

    let similar: Vec<AgentId> = neighbors
        .into_iter()
        .filter(|n| agent.is_similar(agents[n.0].opinion()))
        .collect();
    let k = similar.len();
    if k < 2 {
        return 0.0;
    }

    let mut connected = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            if graph.has_edge(similar[i], similar[j]) {
                connected += 1;
            }
        }
    }
    let possible = k * (k - 1) / 2;
    connected as f64 / possible as f64
}

/// Population average of [`agent_clustering_coefficient`]; 0 for an empty
/// population.
pub fn opinion_clustering_coefficient(graph: &SocialGraph, agents: &[Agent]) -> f64 {
    if agents.is_empty() {
        return 0.0;
    }
    let total: f64 = agents
        .iter()
        .map(|a| agent_clustering_coefficient(graph, agents, a.id()))
        .sum();
    total / agents.len() as f64
}

/// Mean `|opinion - 0.5|`; 0 for an empty population.
pub fn radicalization(agents: &[Agent]) -> f64 {
    if agents.is_empty() {
        return 0.0;
    }
    let total: f64 = agents.iter().map(|a| (a.opinion() - NEUTRAL).abs()).sum();
    total / agents.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents(opinions: &[f64], tolerance: f64) -> Vec<Agent> {
        opinions
            .iter()
            .enumerate()
            .map(|(i, &o)| Agent::new(AgentId(i), o, tolerance))
            .collect()
    }

    fn graph(n: usize, edges: &[(usize, usize)]) -> SocialGraph {
        let mut g = SocialGraph::with_agents(n);
        for &(a, b) in edges {
            g.add_edge(AgentId(a), AgentId(b));
        }
        g
    }

    /// Two disjoint triangles: {0, 1, 2} positive, {3, 4, 5} negative.
    fn two_chambers() -> (SocialGraph, Vec<Agent>) {
        (
            graph(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]),
            agents(&[0.9, 0.9, 0.9, 0.1, 0.1, 0.1], 0.3),
        )
    }

    #[test]
    fn test_edgeless_defaults() {
        let g = SocialGraph::with_agents(4);
        let pop = agents(&[0.1, 0.5, 0.7, 0.9], 0.3);
        let snap = MetricsSnapshot::capture(0, &g, &pop, false);
        assert_eq!(snap.num_clusters, 4);
        assert_eq!(snap.opinion_homophily, 0.0);
        assert_eq!(snap.opinion_modularity, 0.0);
        assert_eq!(snap.opinion_clustering_coefficient, 0.0);
        assert_eq!(snap.radicalization, None);
    }

    #[test]
    fn test_two_chambers() {
        let (g, pop) = two_chambers();
        let snap = MetricsSnapshot::capture(3, &g, &pop, true);
        assert_eq!(snap.step, 3);
        assert_eq!(snap.num_clusters, 2);
        assert_eq!(snap.opinion_homophily, 1.0);
        assert!((snap.opinion_modularity - 0.5).abs() < 1e-12);
        assert_eq!(snap.opinion_clustering_coefficient, 1.0);
        assert!((snap.radicalization.unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_bridge_lowers_homophily() {
        let (mut g, pop) = two_chambers();
        g.add_edge(AgentId(2), AgentId(3));
        // Agent 2 now has neighbors 0.9, 0.9, 0.1 -> still positive.
        // Agent 3 has neighbors 0.1, 0.1, 0.9 -> still negative.
        let h = opinion_homophily(&g, &pop);
        assert!((h - 6.0 / 7.0).abs() < 1e-12);
        assert_eq!(cluster_count(&g), 1);
    }

    #[test]
    fn test_homophily_state_uses_neighbor_majority() {
        // A positive agent surrounded by negatives is classed negative.
        let g = graph(3, &[(0, 1), (0, 2)]);
        let pop = agents(&[0.9, 0.1, 0.2], 0.3);
        let states = opinion_states(&g, &pop);
        assert_eq!(states[0], OpinionState::Negative);
        // Leaves have a single positive neighbor.
        assert_eq!(states[1], OpinionState::Positive);
        assert_eq!(opinion_homophily(&g, &pop), 0.0);
    }

    #[test]
    fn test_connected_mixed_clique_has_low_homophily() {
        // Alternating sides on K4: every agent is outvoted by its neighbors,
        // so the neighbor-majority states alternate too.
        let g = graph(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let pop = agents(&[0.6, 0.1, 0.6, 0.1], 1.0);
        assert_eq!(
            opinion_states(&g, &pop),
            vec![
                OpinionState::Negative,
                OpinionState::Positive,
                OpinionState::Negative,
                OpinionState::Positive,
            ]
        );
        assert_eq!(cluster_count(&g), 1);
        assert!((opinion_homophily(&g, &pop) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_agents_form_own_community() {
        let g = graph(2, &[(0, 1)]);
        let pop = agents(&[0.5, 0.5], 0.3);
        // One community holding every edge: Q = 1 - 1 = 0.
        assert!(opinion_modularity(&g, &pop).abs() < 1e-12);
        assert_eq!(opinion_homophily(&g, &pop), 1.0);
    }

    #[test]
    fn test_cross_cutting_partition_is_negative() {
        let g = graph(2, &[(0, 1)]);
        let pop = agents(&[0.9, 0.1], 0.3);
        // Two communities, no internal edges: Q = -2 * (1/2)^2.
        assert!((opinion_modularity(&g, &pop) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clustering_ignores_dissimilar_neighbors() {
        // Agent 0 sees 1, 2 (similar, connected) and 3 (dissimilar).
        let g = graph(4, &[(0, 1), (0, 2), (0, 3), (1, 2)]);
        let pop = agents(&[0.5, 0.6, 0.4, 1.0], 0.3);
        assert_eq!(agent_clustering_coefficient(&g, &pop, AgentId(0)), 1.0);

        // Same neighborhood without the 1 - 2 link.
        let open = graph(4, &[(0, 1), (0, 2), (0, 3)]);
        assert_eq!(agent_clustering_coefficient(&open, &pop, AgentId(0)), 0.0);
    }

    #[test]
    fn test_clustering_needs_two_similar_neighbors() {
        let g = graph(3, &[(0, 1), (0, 2), (1, 2)]);
        let pop = agents(&[0.5, 0.55, 1.0], 0.3);
        assert_eq!(agent_clustering_coefficient(&g, &pop, AgentId(0)), 0.0);
    }

    #[test]
    fn test_isolated_agent() {
        let g = graph(4, &[(0, 1), (1, 2), (0, 2)]);
        let pop = agents(&[0.6, 0.6, 0.6, 0.2], 0.3);
        assert_eq!(agent_clustering_coefficient(&g, &pop, AgentId(3)), 0.0);
        assert_eq!(cluster_count(&g), 2);
        assert_eq!(opinion_clustering_coefficient(&g, &pop), 0.75);
        assert_eq!(opinion_homophily(&g, &pop), 1.0);
    }

    #[test]
    fn test_radicalization() {
        let pop = agents(&[0.0, 0.5, 1.0, 0.7], 0.3);
        assert!((radicalization(&pop) - 0.3).abs() < 1e-12);
        assert_eq!(radicalization(&[]), 0.0);
    }
}

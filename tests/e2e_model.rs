//! End-to-end model tests.
//!
//! These tests drive whole runs through the public API and check the
//! behavior of hand-built scenarios with known outcomes.

use echo_chamber::{
    ActivationPolicy, Agent, AgentId, EchoChamberModel, ModelParams, SocialGraph,
};

fn population(opinions: &[f64], tolerance: f64) -> Vec<Agent> {
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

/// Same seed, same parameters: identical metric series and final network
#[test]
fn test_seeded_runs_are_reproducible() {
    for policy in ActivationPolicy::ALL {
        let params = ModelParams::default()
            .with_agents(30)
            .with_schedule(policy)
            .with_radical(true)
            .with_seed(5);

        let mut first = EchoChamberModel::initialize(params.clone()).unwrap();
        let mut second = EchoChamberModel::initialize(params).unwrap();
        first.run(8);
        second.run(8);

        assert_eq!(first.snapshots(), second.snapshots());
        assert_eq!(first.graph_view(), second.graph_view());
    }
}

/// Different seeds draw different initial populations
#[test]
fn test_seed_changes_population() {
    let a = EchoChamberModel::initialize(ModelParams::default().with_seed(1)).unwrap();
    let b = EchoChamberModel::initialize(ModelParams::default().with_seed(2)).unwrap();
    assert_ne!(a.agents(), b.agents());
}

/// Full tolerance on an all-positive path: nothing breaks, everyone agrees
#[test]
fn test_full_tolerance_keeps_positive_path_together() {
    let params = ModelParams::default()
        .with_agents(4)
        .with_avg_degree(1.0)
        .with_tolerance(1.0)
        .with_connections(0, 0)
        .with_schedule(ActivationPolicy::Sequential);
    let mut model = EchoChamberModel::from_parts(
        params,
        graph(4, &[(0, 1), (1, 2), (2, 3)]),
        population(&[0.6, 0.7, 0.8, 0.9], 1.0),
    )
    .unwrap();

    model.run(5);

    let last = model.snapshots().last().unwrap();
    assert_eq!(last.opinion_homophily, 1.0);
    assert_eq!(last.num_clusters, 1);
    assert_eq!(model.graph().edge_count(), 3);
    assert!(model.agents().iter().all(|a| a.opinion() > 0.5));
}

/// Zero tolerance: after one step no edge joins unequal opinions
#[test]
fn test_zero_tolerance_breaks_unequal_edges() {
    for policy in ActivationPolicy::ALL {
        let params = ModelParams::default()
            .with_agents(10)
            .with_tolerance(0.0)
            .with_schedule(policy)
            .with_seed(3);
        let mut model = EchoChamberModel::initialize(params).unwrap();
        let before = model.graph().edge_count();

        model.step();

        assert!(model.graph().edge_count() <= before);
        for (a, b) in model.graph().edges() {
            assert_eq!(
                model.agents()[a.0].opinion(),
                model.agents()[b.0].opinion(),
                "{a} -- {b} survived under {policy}"
            );
        }
    }
}

/// No connection making and nothing dissimilar: the edge set is frozen
#[test]
fn test_no_connection_making_keeps_edge_count() {
    let params = ModelParams::default()
        .with_tolerance(1.0)
        .with_connections(0, 0)
        .with_seed(8);
    let mut model = EchoChamberModel::initialize(params).unwrap();
    let edges = model.graph().edges();

    model.run(10);

    assert_eq!(model.graph().edges(), edges);
}

/// No connection making: edges only ever disappear
#[test]
fn test_no_connection_making_never_adds() {
    let params = ModelParams::default()
        .with_agents(25)
        .with_tolerance(0.2)
        .with_connections(0, 0)
        .with_seed(13);
    let mut model = EchoChamberModel::initialize(params).unwrap();

    let mut previous = model.graph().edge_count();
    for _ in 0..10 {
        model.step();
        let current = model.graph().edge_count();
        assert!(current <= previous);
        previous = current;
    }
}

/// An isolated agent keeps its opinion and scores zero clustering
#[test]
fn test_isolated_agent_is_untouched() {
    let params = ModelParams::default()
        .with_agents(3)
        .with_avg_degree(1.0)
        .with_tolerance(0.5)
        .with_connections(0, 0)
        .with_schedule(ActivationPolicy::Sequential);
    let mut model = EchoChamberModel::from_parts(
        params,
        graph(3, &[(0, 1)]),
        population(&[0.6, 0.7, 0.33], 0.5),
    )
    .unwrap();

    model.run(3);

    assert_eq!(model.agents()[2].opinion(), 0.33);
    assert_eq!(model.graph().degree(AgentId(2)), 0);
    assert_eq!(model.snapshots().last().unwrap().num_clusters, 2);
}

/// Edgeless start: all edge metrics fall back to zero
#[test]
fn test_edgeless_network_metrics() {
    let params = ModelParams::default()
        .with_agents(6)
        .with_avg_degree(0.0)
        .with_connections(0, 0);
    let model = EchoChamberModel::initialize(params).unwrap();

    assert_eq!(model.graph().edge_count(), 0);
    let initial = &model.snapshots()[0];
    assert_eq!(initial.num_clusters, 6);
    assert_eq!(initial.opinion_homophily, 0.0);
    assert_eq!(initial.opinion_modularity, 0.0);
    assert_eq!(initial.opinion_clustering_coefficient, 0.0);
}

/// A single agent runs without edges or errors
#[test]
fn test_single_agent_population() {
    let params = ModelParams::default()
        .with_agents(1)
        .with_avg_degree(0.0)
        .with_connections(1, 1)
        .with_radical(true);
    let mut model = EchoChamberModel::initialize(params).unwrap();
    let opinion = model.agents()[0].opinion();

    model.run(3);

    assert_eq!(model.graph().edge_count(), 0);
    assert_eq!(model.agents()[0].opinion(), opinion);
    assert_eq!(model.snapshots().len(), 4);
}

/// The exported view reflects the model without aliasing it
#[test]
fn test_graph_view_export() {
    let mut model = EchoChamberModel::initialize(ModelParams::default()).unwrap();
    model.run(2);

    let mut view = model.graph_view();
    assert_eq!(view.nodes.len(), 20);
    assert_eq!(view.edges.len(), model.graph().edge_count());
    assert!(view.edges.iter().all(|e| e.source < e.target));

    let dot = view.to_dot();
    assert_eq!(dot.matches(" -- ").count(), view.edges.len());

    view.edges.clear();
    assert_eq!(model.graph_view().edges.len(), model.graph().edge_count());
}

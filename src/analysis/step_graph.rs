//! 步图（可达图）构造：从初始网出发，对每个可发生迁移在副本上发生，
//! 以结构相等去重，记录状态之间的弧。
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use itertools::Itertools;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;

use crate::net::core::{PetriNet, escape_label};
use crate::net::ids::{NodeId, StepId};
use crate::net::structure::Transition;
use crate::unrecoverable;

/// `target` is reached from `source` by firing one enabled transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetArc {
    pub source: StepId,
    pub target: StepId,
}

impl NetArc {
    pub fn new(source: StepId, target: StepId) -> Self {
        Self { source, target }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StepGraphConfig {
    /// 最多探索的状态数量. None 表示不设上限.
    pub state_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepGraphStats {
    pub step_count: usize,
    pub arc_count: usize,
    pub deadlock_count: usize,
    pub truncated: bool,
}

/// The reachability graph of a net. Steps are unique under structural
/// equality and addressed by insertion order; the initial net is step 0.
#[derive(Debug, Clone)]
pub struct StepGraph {
    steps: IndexSet<PetriNet>,
    arcs: IndexSet<NetArc>,
    state_limit: Option<usize>,
    truncated: bool,
}

impl StepGraph {
    pub fn new(initial: PetriNet) -> Self {
        Self::with_config(initial, &StepGraphConfig::default())
    }

    pub fn with_config(initial: PetriNet, config: &StepGraphConfig) -> Self {
        let mut steps = IndexSet::new();
        steps.insert(initial);
        Self {
            steps,
            arcs: IndexSet::new(),
            state_limit: config.state_limit,
            truncated: false,
        }
    }

    pub fn initial_id(&self) -> StepId {
        StepId::new(0)
    }

    pub fn initial(&self) -> &PetriNet {
        &self.steps[0]
    }

    pub fn step(&self, id: StepId) -> Option<&PetriNet> {
        self.steps.get_index(id.index())
    }

    pub fn steps(&self) -> impl Iterator<Item = (StepId, &PetriNet)> {
        self.steps
            .iter()
            .enumerate()
            .map(|(idx, net)| (StepId::from_usize(idx), net))
    }

    pub fn arcs(&self) -> impl Iterator<Item = &NetArc> {
        self.arcs.iter()
    }

    /// Whether the state limit dropped any newly reached marking.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn find(&self, net: &PetriNet) -> Option<StepId> {
        self.steps.get_index_of(net).map(StepId::from_usize)
    }

    pub fn contains(&self, net: &PetriNet) -> bool {
        self.steps.contains(net)
    }

    pub fn successors(&self, id: StepId) -> impl Iterator<Item = StepId> + '_ {
        self.arcs
            .iter()
            .filter(move |arc| arc.source == id)
            .map(|arc| arc.target)
    }

    /// Steps in which no transition is enabled.
    pub fn deadlocks(&self) -> Vec<StepId> {
        self.steps()
            .filter(|(_, net)| net.enabled_transitions().is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// The transitions enabled together in each step, one set per step that
    /// enables anything.
    pub fn parallel_sets(&self) -> Vec<Vec<Transition>> {
        self.steps
            .iter()
            .map(|net| {
                net.enabled_transitions()
                    .into_iter()
                    .filter_map(|id| net.transition(id).cloned())
                    .collect::<Vec<_>>()
            })
            .filter(|set| !set.is_empty())
            .collect()
    }

    pub fn is_reachable(&self, from: StepId, to: StepId) -> bool {
        let mut visited = vec![false; self.steps.len()];
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            match visited.get_mut(current.index()) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            queue.extend(self.successors(current));
        }
        false
    }

    pub fn stats(&self) -> StepGraphStats {
        StepGraphStats {
            step_count: self.step_count(),
            arc_count: self.arc_count(),
            deadlock_count: self.deadlocks().len(),
            truncated: self.truncated,
        }
    }

    /// A petgraph view; node `i` carries `StepId(i)`.
    pub fn to_graph(&self) -> StableGraph<StepId, ()> {
        let mut graph = StableGraph::with_capacity(self.steps.len(), self.arcs.len());
        for (id, _) in self.steps() {
            graph.add_node(id);
        }
        for arc in &self.arcs {
            graph.add_edge(
                NodeIndex::new(arc.source.index()),
                NodeIndex::new(arc.target.index()),
                (),
            );
        }
        graph
    }

    pub fn dot(&self) -> String {
        let graph = self.to_graph();
        let node_label = |id: StepId| -> String {
            let Some(net) = self.step(id) else {
                return String::new();
            };
            let marking = net
                .places()
                .filter(|place| place.markers > 0)
                .map(|place| format!("{}:{}", escape_label(&place.name), place.markers))
                .join(", ");
            let enabled = net
                .enabled_transitions()
                .into_iter()
                .filter_map(|t| net.transition(t))
                .map(|t| escape_label(&t.name))
                .join(", ");
            let mut label = format!("s{}\\nmarking: {}", id, marking);
            if !enabled.is_empty() {
                label.push_str(&format!("\\nenabled: {}", enabled));
            }
            label
        };

        format!(
            "{:?}",
            Dot::with_attr_getters(
                &graph,
                &[Config::NodeNoLabel, Config::EdgeNoLabel],
                &|_, _| String::new(),
                &|_, (_, id)| format!("label=\"{}\"", node_label(*id)),
            )
        )
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let dot = self.dot();
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, dot)
    }
}

struct PendingStep {
    parent: StepId,
    copy: PetriNet,
    transition: NodeId,
}

fn schedule_enabled(pending: &mut Vec<PendingStep>, parent: StepId, net: &PetriNet) {
    // Reverse so that the lowest transition id is expanded first.
    for transition in net.enabled_transitions().into_iter().rev() {
        pending.push(PendingStep {
            parent,
            copy: net.deep_copy(),
            transition,
        });
    }
}

pub fn build_step_graph(initial: &PetriNet) -> StepGraph {
    build_step_graph_with_config(initial, &StepGraphConfig::default())
}

/// Explores every marking reachable from `initial`. Only terminates for
/// bounded nets unless `config.state_limit` is set.
pub fn build_step_graph_with_config(initial: &PetriNet, config: &StepGraphConfig) -> StepGraph {
    let mut graph = StepGraph::with_config(initial.deep_copy(), config);
    let mut pending = Vec::new();
    schedule_enabled(&mut pending, graph.initial_id(), initial);

    while let Some(PendingStep {
        parent,
        copy,
        transition,
    }) = pending.pop()
    {
        let Some(step) = add_step_to_step_graph(&mut graph, parent, copy, transition) else {
            continue;
        };
        if let Some(net) = graph.step(step) {
            schedule_enabled(&mut pending, step, net);
        }
    }

    log::info!(
        "step graph: {} steps, {} arcs{}",
        graph.step_count(),
        graph.arc_count(),
        if graph.truncated { " (truncated)" } else { "" }
    );
    graph
}

/// Fires `transition` on `copy_of_parent` and records the result.
///
/// Returns the new step when the resulting marking was not known yet. A known
/// marking only gets an arc from `parent`, and is not expanded again.
///
/// # Panics
///
/// Panics when `copy_of_parent` has no enabled transition with the given id,
/// which means the copy does not mirror its parent.
pub fn add_step_to_step_graph(
    graph: &mut StepGraph,
    parent: StepId,
    mut copy_of_parent: PetriNet,
    transition: NodeId,
) -> Option<StepId> {
    if copy_of_parent.transition(transition).is_none() {
        unrecoverable!("transition {} missing from copy of step {}", transition, parent);
    }
    if !copy_of_parent.fire(transition) {
        unrecoverable!("transition {} not enabled in copy of step {}", transition, parent);
    }

    if let Some(existing) = graph.find(&copy_of_parent) {
        log::trace!("{} -[{}]-> {} (known)", parent, transition, existing);
        graph.arcs.insert(NetArc::new(parent, existing));
        return None;
    }

    if graph
        .state_limit
        .is_some_and(|limit| graph.steps.len() >= limit)
    {
        if !graph.truncated {
            log::warn!("state limit reached, step graph truncated");
        }
        graph.truncated = true;
        return None;
    }

    let (index, _) = graph.steps.insert_full(copy_of_parent);
    let step = StepId::from_usize(index);
    log::debug!("{} -[{}]-> {} (new)", parent, transition, step);
    graph.arcs.insert(NetArc::new(parent, step));
    Some(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::ContextObject;

    fn single_transition() -> (PetriNet, NodeId, NodeId, NodeId) {
        let mut net = PetriNet::new();
        let p = net.add_place("P", 1);
        let t = net.add_transition("T", ContextObject::reading("T"));
        let q = net.add_place("Q", 0);
        net.add_arc(p, t).unwrap();
        net.add_arc(t, q).unwrap();
        (net, p, t, q)
    }

    fn two_cycle() -> PetriNet {
        let mut net = PetriNet::new();
        let p1 = net.add_place("P1", 1);
        let t1 = net.add_transition("T1", ContextObject::empty());
        let p2 = net.add_place("P2", 0);
        let t2 = net.add_transition("T2", ContextObject::empty());
        net.add_arc(p1, t1).unwrap();
        net.add_arc(t1, p2).unwrap();
        net.add_arc(p2, t2).unwrap();
        net.add_arc(t2, p1).unwrap();
        net
    }

    #[test]
    fn single_firing_gives_two_steps_one_arc() {
        let (net, p, _, q) = single_transition();
        let graph = build_step_graph(&net);

        assert_eq!(graph.step_count(), 2);
        assert_eq!(graph.arc_count(), 1);
        assert_eq!(graph.initial(), &net);

        let fired = graph.step(StepId::new(1)).unwrap();
        assert_eq!(fired.markers(p), Some(0));
        assert_eq!(fired.markers(q), Some(1));
        assert_eq!(
            graph.arcs().copied().collect::<Vec<_>>(),
            vec![NetArc::new(StepId::new(0), StepId::new(1))]
        );
    }

    #[test]
    fn cycle_returns_to_initial_step() {
        let net = two_cycle();
        let graph = build_step_graph(&net);

        assert_eq!(graph.step_count(), 2);
        assert_eq!(graph.arc_count(), 2);
        let arcs: Vec<_> = graph.arcs().copied().collect();
        assert!(arcs.contains(&NetArc::new(StepId::new(0), StepId::new(1))));
        assert!(arcs.contains(&NetArc::new(StepId::new(1), StepId::new(0))));
        assert!(graph.deadlocks().is_empty());
    }

    #[test]
    fn concurrent_branches_meet_in_one_step() {
        let mut net = PetriNet::new();
        let a = net.add_place("a", 1);
        let ta = net.add_transition("ta", ContextObject::empty());
        let a2 = net.add_place("a2", 0);
        let b = net.add_place("b", 1);
        let tb = net.add_transition("tb", ContextObject::empty());
        let b2 = net.add_place("b2", 0);
        net.add_arc(a, ta).unwrap();
        net.add_arc(ta, a2).unwrap();
        net.add_arc(b, tb).unwrap();
        net.add_arc(tb, b2).unwrap();

        let graph = build_step_graph(&net);

        assert_eq!(graph.step_count(), 4);
        assert_eq!(graph.arc_count(), 4);
        assert_eq!(graph.deadlocks().len(), 1);
        let last = graph.deadlocks()[0];
        assert!(graph.is_reachable(graph.initial_id(), last));
        assert!(!graph.is_reachable(last, graph.initial_id()));
    }

    #[test]
    fn state_limit_truncates_graph() {
        let (net, _, _, _) = single_transition();
        let config = StepGraphConfig {
            state_limit: Some(1),
        };
        let graph = build_step_graph_with_config(&net, &config);

        assert!(graph.truncated());
        assert_eq!(graph.step_count(), 1);
        assert_eq!(graph.arc_count(), 0);
    }

    #[test]
    fn parallel_sets_follow_enabled_transitions() {
        let (net, _, t, _) = single_transition();
        let graph = build_step_graph(&net);
        let sets = graph.parallel_sets();

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].len(), 1);
        assert_eq!(sets[0][0].id, t);
    }

    #[test]
    fn stats_summarise_graph() {
        let graph = build_step_graph(&two_cycle());
        assert_eq!(
            graph.stats(),
            StepGraphStats {
                step_count: 2,
                arc_count: 2,
                deadlock_count: 0,
                truncated: false,
            }
        );
        assert_eq!(graph.to_graph().edge_count(), 2);
    }

    #[test]
    fn dot_labels_markings() {
        let (net, _, _, _) = single_transition();
        let dot = build_step_graph(&net).dot();
        assert!(dot.contains("s0\\nmarking: P:1\\nenabled: T"));
        assert!(dot.contains("s1\\nmarking: Q:1"));
        assert!(dot.contains("0 -> 1"));
    }

    #[test]
    fn dot_escapes_names_like_net_dot() {
        let mut net = PetriNet::new();
        let p = net.add_place("two\nlines \"quoted\"", 1);
        let t = net.add_transition("t", ContextObject::empty());
        net.add_arc(p, t).unwrap();

        let dot = build_step_graph(&net).dot();
        assert!(dot.contains("marking: two\\nlines \\\"quoted\\\":1"));
        assert!(net.to_dot().contains("two\\nlines \\\"quoted\\\""));
    }

    #[test]
    #[should_panic(expected = "not enabled in copy")]
    fn disabled_transition_in_copy_panics() {
        let (net, p, t, _) = single_transition();
        let mut copy = net.deep_copy();
        copy.set_markers(p, 0).unwrap();
        let mut graph = StepGraph::new(net);
        add_step_to_step_graph(&mut graph, StepId::new(0), copy, t);
    }

    #[test]
    #[should_panic(expected = "unrecoverable")]
    fn missing_transition_in_copy_panics() {
        let (net, _, _, _) = single_transition();
        let mut graph = StepGraph::new(net);
        add_step_to_step_graph(&mut graph, StepId::new(0), PetriNet::new(), NodeId::new(1));
    }
}

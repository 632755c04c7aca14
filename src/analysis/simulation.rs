//! 最大步语义下的模拟：每一轮让所有可发生迁移同时发生，直至不再变化。
//!
//! 一轮中库所最多失去一个标记、最多获得一个标记，即使它被多个迁移共享。
use std::collections::BTreeSet;

use crate::net::core::PetriNet;
use crate::net::ids::NodeId;
use crate::net::structure::Node;

#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    /// 最多执行的轮数. None 表示不设上限.
    pub round_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Rounds that changed the net.
    pub rounds: usize,
    /// `false` when the round limit stopped the simulation first.
    pub quiescent: bool,
}

/// Performs one round. Returns whether anything was collected for change.
pub fn make_step(net: &mut PetriNet) -> bool {
    let mut lose: BTreeSet<NodeId> = BTreeSet::new();
    let mut gain: BTreeSet<NodeId> = BTreeSet::new();

    for transition in net.enabled_transitions() {
        lose.extend(net.input_places(transition));
        gain.extend(net.output_places(transition));
    }

    for id in &lose {
        if let Some(place) = net.node_mut(*id).and_then(Node::as_place_mut) {
            place.markers -= 1;
        }
    }
    for id in &gain {
        if let Some(place) = net.node_mut(*id).and_then(Node::as_place_mut) {
            place.markers += 1;
        }
    }

    log::trace!("step: {} places lose, {} places gain", lose.len(), gain.len());
    !lose.is_empty() || !gain.is_empty()
}

/// Steps until quiescence. Does not return for nets that keep changing,
/// e.g. a marked cycle or a source transition with an output place.
pub fn simulate_net(net: &mut PetriNet) -> SimulationOutcome {
    simulate_net_with_config(net, &SimulationConfig::default())
}

pub fn simulate_net_with_config(net: &mut PetriNet, config: &SimulationConfig) -> SimulationOutcome {
    let mut rounds = 0;
    loop {
        if config.round_limit.is_some_and(|limit| rounds >= limit) {
            log::warn!("simulation stopped after {} rounds without quiescence", rounds);
            return SimulationOutcome {
                rounds,
                quiescent: false,
            };
        }
        if !make_step(net) {
            log::debug!("simulation quiescent after {} rounds", rounds);
            return SimulationOutcome {
                rounds,
                quiescent: true,
            };
        }
        rounds += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::ContextObject;

    #[test]
    fn pipeline_runs_to_quiescence() {
        let mut net = PetriNet::new();
        let p0 = net.add_place("p0", 1);
        let t0 = net.add_transition("t0", ContextObject::empty());
        let p1 = net.add_place("p1", 0);
        let t1 = net.add_transition("t1", ContextObject::empty());
        let p2 = net.add_place("p2", 0);
        net.add_arc(p0, t0).unwrap();
        net.add_arc(t0, p1).unwrap();
        net.add_arc(p1, t1).unwrap();
        net.add_arc(t1, p2).unwrap();

        let outcome = simulate_net(&mut net);

        assert_eq!(
            outcome,
            SimulationOutcome {
                rounds: 2,
                quiescent: true
            }
        );
        assert_eq!(net.marking(), vec![(p0, 0), (p1, 0), (p2, 1)]);
    }

    #[test]
    fn shared_input_loses_one_marker_per_round() {
        let mut net = PetriNet::new();
        let shared = net.add_place("shared", 2);
        let left = net.add_transition("left", ContextObject::empty());
        let right = net.add_transition("right", ContextObject::empty());
        let a = net.add_place("a", 0);
        let b = net.add_place("b", 0);
        net.add_arc(shared, left).unwrap();
        net.add_arc(shared, right).unwrap();
        net.add_arc(left, a).unwrap();
        net.add_arc(right, b).unwrap();

        assert!(make_step(&mut net));
        assert_eq!(net.markers(shared), Some(1));
        assert_eq!(net.markers(a), Some(1));
        assert_eq!(net.markers(b), Some(1));
    }

    #[test]
    fn dead_net_reports_no_change() {
        let mut net = PetriNet::new();
        let p = net.add_place("p", 0);
        let t = net.add_transition("t", ContextObject::empty());
        net.add_arc(p, t).unwrap();

        let before = net.clone();
        assert!(!make_step(&mut net));
        assert_eq!(net, before);
    }

    #[test]
    fn round_limit_stops_marked_cycle() {
        let mut net = PetriNet::new();
        let p1 = net.add_place("p1", 1);
        let t1 = net.add_transition("t1", ContextObject::empty());
        let p2 = net.add_place("p2", 0);
        let t2 = net.add_transition("t2", ContextObject::empty());
        net.add_arc(p1, t1).unwrap();
        net.add_arc(t1, p2).unwrap();
        net.add_arc(p2, t2).unwrap();
        net.add_arc(t2, p1).unwrap();

        let config = SimulationConfig {
            round_limit: Some(5),
        };
        let outcome = simulate_net_with_config(&mut net, &config);

        assert!(!outcome.quiescent);
        assert_eq!(outcome.rounds, 5);
        assert_eq!(net.total_markers(), 1);
        assert_eq!(net.markers(p2), Some(1));
    }
}

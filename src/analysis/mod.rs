pub mod simulation;
pub mod step_graph;

pub use simulation::{
    SimulationConfig, SimulationOutcome, make_step, simulate_net, simulate_net_with_config,
};
pub use step_graph::{
    NetArc, StepGraph, StepGraphConfig, StepGraphStats, add_step_to_step_graph, build_step_graph,
    build_step_graph_with_config,
};

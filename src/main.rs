use anyhow::{Context, Result};

use pn_step::analysis::{build_step_graph_with_config, simulate_net_with_config};
use pn_step::config::EngineConfig;
use pn_step::net::io::read_net;
use pn_step::options::{Mode, Options};

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let mut flags = shellwords::split(&std::env::var("PN_FLAGS").unwrap_or_default())
        .context("PN_FLAGS is not a valid argument string")?;
    flags.extend(std::env::args().skip(1));

    let options = Options::parse_from_args(&flags).map_err(|e| anyhow::anyhow!("{e}"))?;
    log::debug!("pn-step options: {:?}", options);

    let config = EngineConfig::load_from_file(&options.config)?;
    let net = read_net(&options.net)
        .with_context(|| format!("Failed to load net: {:?}", options.net))?;
    net.log_diagnostics();

    if matches!(options.mode, Mode::Simulate | Mode::All) {
        let mut simulated = net.deep_copy();
        let outcome = simulate_net_with_config(&mut simulated, &config.simulation());
        println!(
            "simulation: {} rounds, {}",
            outcome.rounds,
            if outcome.quiescent {
                "quiescent"
            } else {
                "round limit reached"
            }
        );
        for place in simulated.places() {
            println!("  {}: {}", place.name, place.markers);
        }
    }

    if matches!(options.mode, Mode::StepGraph | Mode::All) {
        let graph = build_step_graph_with_config(&net, &config.step_graph());
        let stats = graph.stats();
        println!(
            "step graph: {} steps, {} arcs, {} deadlocks{}",
            stats.step_count,
            stats.arc_count,
            stats.deadlock_count,
            if stats.truncated { ", truncated" } else { "" }
        );

        if let Some(path) = options.dot.as_ref().or(config.dot_output.as_ref()) {
            graph
                .write_dot(path)
                .with_context(|| format!("Failed to write dot file: {:?}", path))?;
            log::info!("step graph written to {:?}", path);
        }
    }

    Ok(())
}

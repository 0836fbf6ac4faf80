use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use serde_json::json;

use ptsim::analysis::StateGraph;
use ptsim::config::SimConfig;
use ptsim::net::{Collector, DiagnosticSink, LogSink, NetModel, io};
use ptsim::options::{Action, Options};
use ptsim::simulate::Simulator;

fn main() {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("pn-sim: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let options = Options::parse_from_args(args)?;
    debug!("pn-sim options: {:?}", options);

    let config = SimConfig::load_from_file(&options.config)?;
    let document = io::read_document(&options.net)
        .with_context(|| format!("Failed to read net document: {}", options.net))?;

    let mut collector = Collector::new();
    let mut log_sink = LogSink;
    let model = {
        let sink: &mut dyn DiagnosticSink = match options.action {
            Action::Check => &mut collector,
            _ => &mut log_sink,
        };
        NetModel::from_document(&document, sink).with_token_cap(config.token_cap)
    };
    info!(
        "loaded {} places, {} transitions, {} arcs from {}",
        model.places_len(),
        model.transitions_len(),
        model.arcs_len(),
        options.net
    );

    match options.action {
        Action::Enabled => {
            let enabled: Vec<&str> = model
                .enabled_transitions()
                .into_iter()
                .map(|t| t.id.as_str())
                .collect();
            emit(&options, &enabled)
        }
        Action::Fire { ref transition } => {
            let next = model.fire(transition)?;
            emit(&options, &next.to_document())
        }
        Action::Reach { max_steps } => {
            let exploration = model.explore(max_steps.unwrap_or(config.max_steps));
            info!(
                "{} markings after {} steps ({:?})",
                exploration.markings.len(),
                exploration.steps,
                exploration.termination
            );
            emit(&options, &exploration)
        }
        Action::Run {
            policy,
            max_steps,
            seed,
        } => {
            let mut run_config = config.run_config();
            if let Some(policy) = policy {
                run_config.policy = policy;
            }
            if let Some(max_steps) = max_steps {
                run_config.max_steps = max_steps;
            }
            if seed.is_some() {
                run_config.seed = seed;
            }
            let outcome = Simulator::new(model, run_config).run();
            emit(&options, &outcome.report())
        }
        Action::Stats => emit(&options, &model.stats()),
        Action::Graph {
            state_limit,
            ref dot,
        } => {
            let mut graph_config = config.state_graph_config();
            if state_limit.is_some() {
                graph_config.state_limit = state_limit;
            }
            let state_graph = StateGraph::with_config(&model, graph_config);
            if let Some(path) = dot {
                state_graph
                    .write_dot(path)
                    .with_context(|| format!("Failed to write dot file: {}", path))?;
            }
            let dead: Vec<_> = state_graph
                .dead
                .iter()
                .map(|&node| &state_graph.node(node).marking)
                .collect();
            emit(
                &options,
                &json!({
                    "stats": state_graph.stats(),
                    "deadlocks": dead,
                }),
            )
        }
        Action::Check => {
            let warnings: Vec<String> = collector
                .warnings()
                .iter()
                .map(ToString::to_string)
                .collect();
            emit(
                &options,
                &json!({
                    "warnings": warnings,
                    "connectivity": model.diagnose_connectivity(),
                }),
            )
        }
    }
}

fn emit<T: Serialize>(options: &Options, value: &T) -> Result<()> {
    match &options.output {
        Some(path) => {
            io::write_report(path, value)
                .with_context(|| format!("Failed to write output: {}", path))?;
            info!("result written to {}", path);
        }
        None => println!("{}", io::render(Path::new("stdout.json"), value)?),
    }
    Ok(())
}

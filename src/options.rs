//! Parsing Options.
//! `pn-sim [--config FILE] [--output FILE] <NET> <COMMAND>`

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgMatches, Command, value_parser};

use crate::simulate::SelectionPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Enabled,
    Fire {
        transition: String,
    },
    Reach {
        max_steps: Option<usize>,
    },
    Run {
        policy: Option<SelectionPolicy>,
        max_steps: Option<usize>,
        seed: Option<u64>,
    },
    Stats,
    Graph {
        state_limit: Option<usize>,
        dot: Option<String>,
    },
    Check,
}

fn max_steps_arg() -> Arg {
    Arg::new("max-steps")
        .short('n')
        .long("max-steps")
        .value_name("N")
        .help("Iteration budget")
        .value_parser(value_parser!(usize))
}

fn make_options_parser() -> Command {
    Command::new("pn-sim")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Place/Transition net simulator")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML file with simulation defaults")
                .default_value("pn-sim.toml"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the result here (.ron for RON, JSON otherwise) instead of stdout"),
        )
        .arg(
            Arg::new("net")
                .value_name("NET")
                .help("Net document in JSON")
                .required(true),
        )
        .subcommand_required(true)
        .subcommand(Command::new("enabled").about("List enabled transitions"))
        .subcommand(
            Command::new("fire")
                .about("Fire one transition and print the resulting net")
                .arg(Arg::new("transition").value_name("ID").required(true)),
        )
        .subcommand(
            Command::new("reach")
                .about("Step-bounded reachability search")
                .arg(max_steps_arg()),
        )
        .subcommand(
            Command::new("run")
                .about("Randomized token game")
                .arg(
                    Arg::new("policy")
                        .short('p')
                        .long("policy")
                        .value_parser(["single", "maximal"]),
                )
                .arg(max_steps_arg())
                .arg(
                    Arg::new("seed")
                        .short('s')
                        .long("seed")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(Command::new("stats").about("Net statistics"))
        .subcommand(
            Command::new("graph")
                .about("Complete reachability graph summary")
                .arg(
                    Arg::new("state-limit")
                        .long("state-limit")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("dot")
                        .long("dot")
                        .value_name("FILE")
                        .help("Also write the graph in Graphviz format"),
                ),
        )
        .subcommand(Command::new("check").about("Normalization warnings and connectivity"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub net: String,
    pub config: String,
    pub output: Option<String>,
    pub action: Action,
}

impl Options {
    pub fn parse_from_args(flags: &[String]) -> Result<Self> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let net = matches
            .get_one::<String>("net")
            .cloned()
            .context("missing net document")?;
        let config = matches
            .get_one::<String>("config")
            .cloned()
            .unwrap_or_default();
        let output = matches.get_one::<String>("output").cloned();

        let action = match matches.subcommand() {
            Some(("enabled", _)) => Action::Enabled,
            Some(("fire", sub)) => Action::Fire {
                transition: sub
                    .get_one::<String>("transition")
                    .cloned()
                    .context("missing transition id")?,
            },
            Some(("reach", sub)) => Action::Reach {
                max_steps: sub.get_one::<usize>("max-steps").copied(),
            },
            Some(("run", sub)) => Action::Run {
                policy: policy_of(sub)?,
                max_steps: sub.get_one::<usize>("max-steps").copied(),
                seed: sub.get_one::<u64>("seed").copied(),
            },
            Some(("stats", _)) => Action::Stats,
            Some(("graph", sub)) => Action::Graph {
                state_limit: sub.get_one::<usize>("state-limit").copied(),
                dot: sub.get_one::<String>("dot").cloned(),
            },
            Some(("check", _)) => Action::Check,
            Some((other, _)) => return Err(anyhow!("unsupported command {other}")),
            None => return Err(anyhow!("no command given")),
        };

        Ok(Options {
            net,
            config,
            output,
            action,
        })
    }
}

fn policy_of(matches: &ArgMatches) -> Result<Option<SelectionPolicy>> {
    matches
        .get_one::<String>("policy")
        .map(|raw| SelectionPolicy::parse(raw).ok_or_else(|| anyhow!("unknown policy {raw}")))
        .transpose()
}

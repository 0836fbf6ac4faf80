//! Randomized token game.
//!
//! A [`Simulator`] repeatedly picks enabled transitions and fires them until
//! the net deadlocks or the step budget runs out. Transitions without any arc
//! are never candidates: they are always enabled and firing them changes
//! nothing.
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::net::engine::{DEFAULT_MAX_STEPS, Termination};
use crate::net::ids::TransitionIdx;
use crate::net::model::NetModel;
use crate::net::structure::Marking;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// One uniformly chosen enabled transition per step.
    #[default]
    Single,
    /// As many enabled transitions as possible per step, no two sharing an
    /// input place.
    Maximal,
}

impl SelectionPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "maximal" => Some(Self::Maximal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub policy: SelectionPolicy,
    pub max_steps: usize,
    /// Upper bound on a maximal batch; 0 means unbounded.
    pub batch_max: usize,
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::Single,
            max_steps: DEFAULT_MAX_STEPS,
            batch_max: 0,
            seed: None,
        }
    }
}

/// One batch; `step` numbers batches from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Firing {
    pub step: usize,
    pub transitions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub model: NetModel,
    /// Individual transition firings, not batches.
    pub steps: usize,
    pub fired: Vec<Firing>,
    /// `DeadMarking` or `StepBudget`.
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub final_marking: Marking,
    pub steps: usize,
    pub fired: Vec<Firing>,
    pub termination: Termination,
}

impl RunOutcome {
    pub fn report(&self) -> RunReport {
        RunReport {
            final_marking: self.model.marking(),
            steps: self.steps,
            fired: self.fired.clone(),
            termination: self.termination,
        }
    }
}

pub struct Simulator {
    model: NetModel,
    config: RunConfig,
    rng: StdRng,
    candidates: Vec<TransitionIdx>,
    steps: usize,
    fired: Vec<Firing>,
}

impl Simulator {
    pub fn new(model: NetModel, config: RunConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let candidates = model
            .transition_indices()
            .filter(|&t| {
                model.input_weights(t).next().is_some() || model.output_weights(t).next().is_some()
            })
            .collect();
        Self {
            model,
            config,
            rng,
            candidates,
            steps: 0,
            fired: Vec::new(),
        }
    }

    pub fn model(&self) -> &NetModel {
        &self.model
    }

    /// Firings so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_deadlocked(&self) -> bool {
        self.enabled().is_empty()
    }

    /// Fires one batch under the configured policy and counts each member
    /// against the step budget. Returns the fired transition ids, or `None`
    /// if nothing is enabled.
    pub fn step(&mut self) -> Option<Vec<String>> {
        let mut enabled = self.enabled();
        if enabled.is_empty() {
            return None;
        }

        let batch = match self.config.policy {
            SelectionPolicy::Single => {
                let pick = self.rng.random_range(0..enabled.len());
                vec![enabled[pick]]
            }
            SelectionPolicy::Maximal => {
                enabled.shuffle(&mut self.rng);
                self.disjoint_batch(&enabled)
            }
        };

        // Inputs are pairwise disjoint, so every member stays enabled while
        // the batch is applied in sequence.
        for &t in &batch {
            self.model = self.model.fire_at(t);
        }

        self.steps += batch.len();
        let transitions: Vec<String> = batch
            .iter()
            .map(|&t| self.model.transition_at(t).id.clone())
            .collect();
        let batch_number = self.fired.len() + 1;
        debug!(
            "batch {}: fired {:?} -> {} ({} firings)",
            batch_number,
            transitions,
            self.model.marking(),
            self.steps
        );
        self.fired.push(Firing {
            step: batch_number,
            transitions: transitions.clone(),
        });
        Some(transitions)
    }

    pub fn run(mut self) -> RunOutcome {
        let termination = loop {
            if self.steps >= self.config.max_steps {
                break Termination::StepBudget;
            }
            if self.step().is_none() {
                break Termination::DeadMarking;
            }
        };
        debug!(
            "simulation stopped after {} firings: {:?}",
            self.steps, termination
        );
        RunOutcome {
            model: self.model,
            steps: self.steps,
            fired: self.fired,
            termination,
        }
    }

    fn enabled(&self) -> Vec<TransitionIdx> {
        self.candidates
            .iter()
            .copied()
            .filter(|&t| self.model.is_enabled_at(t))
            .collect()
    }

    fn disjoint_batch(&self, shuffled: &[TransitionIdx]) -> Vec<TransitionIdx> {
        let remaining = self.config.max_steps.saturating_sub(self.steps).max(1);
        let limit = match self.config.batch_max {
            0 => remaining,
            n => n.min(remaining),
        };
        let mut claimed = Vec::new();
        let mut batch = Vec::new();
        for &t in shuffled {
            if batch.len() >= limit {
                break;
            }
            let inputs: Vec<_> = self.model.input_weights(t).map(|(place, _)| place).collect();
            if inputs.iter().any(|place| claimed.contains(place)) {
                continue;
            }
            claimed.extend(inputs);
            batch.push(t);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::diagnostics::Collector;
    use crate::net::document::NetDocument;

    fn build(document: NetDocument) -> NetModel {
        NetModel::from_document(&document, &mut Collector::new())
    }

    fn seeded(policy: SelectionPolicy) -> RunConfig {
        RunConfig {
            policy,
            seed: Some(7),
            ..RunConfig::default()
        }
    }

    #[test]
    fn chain_runs_until_deadlock() {
        let model = build(
            NetDocument::new()
                .with_place("p0", 1)
                .with_place("p1", 0)
                .with_place("p2", 0)
                .with_transition("t0")
                .with_transition("t1")
                .with_arc("p0", "t0", 1)
                .with_arc("t0", "p1", 1)
                .with_arc("p1", "t1", 1)
                .with_arc("t1", "p2", 1),
        );
        let outcome = Simulator::new(model, seeded(SelectionPolicy::Single)).run();

        assert_eq!(outcome.termination, Termination::DeadMarking);
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.model.tokens("p2"), Some(1));
        assert_eq!(outcome.fired[0].transitions, vec!["t0".to_owned()]);
        assert_eq!(outcome.fired[1].transitions, vec!["t1".to_owned()]);
    }

    #[test]
    fn cycle_stops_at_step_budget() {
        let model = build(
            NetDocument::new()
                .with_place("P1", 1)
                .with_place("P2", 0)
                .with_transition("T1")
                .with_transition("T2")
                .with_arc("P1", "T1", 1)
                .with_arc("T1", "P2", 1)
                .with_arc("P2", "T2", 1)
                .with_arc("T2", "P1", 1),
        );
        let config = RunConfig {
            max_steps: 5,
            ..seeded(SelectionPolicy::Single)
        };
        let outcome = Simulator::new(model, config).run();

        assert_eq!(outcome.termination, Termination::StepBudget);
        assert_eq!(outcome.steps, 5);
        assert_eq!(outcome.model.tokens("P2"), Some(1));
    }

    #[test]
    fn same_seed_same_trace() {
        let document = NetDocument::new()
            .with_place("p", 10)
            .with_transition("a")
            .with_transition("b")
            .with_transition("c")
            .with_arc("p", "a", 1)
            .with_arc("p", "b", 1)
            .with_arc("p", "c", 1);

        let first = Simulator::new(build(document.clone()), seeded(SelectionPolicy::Single)).run();
        let second = Simulator::new(build(document), seeded(SelectionPolicy::Single)).run();

        assert_eq!(first.fired, second.fired);
        assert_eq!(first.steps, 10);
    }

    #[test]
    fn maximal_never_shares_input_places() {
        let model = build(
            NetDocument::new()
                .with_place("shared", 4)
                .with_transition("ta")
                .with_transition("tb")
                .with_arc("shared", "ta", 1)
                .with_arc("shared", "tb", 1),
        );
        let outcome = Simulator::new(model, seeded(SelectionPolicy::Maximal)).run();

        assert_eq!(outcome.steps, 4);
        assert!(outcome.fired.iter().all(|firing| firing.transitions.len() == 1));
    }

    #[test]
    fn maximal_fires_independent_transitions_together() {
        let document = NetDocument::new()
            .with_place("p1", 1)
            .with_place("p2", 1)
            .with_transition("ta")
            .with_transition("tb")
            .with_arc("p1", "ta", 1)
            .with_arc("p2", "tb", 1);

        let together = Simulator::new(build(document.clone()), seeded(SelectionPolicy::Maximal)).run();
        assert_eq!(together.steps, 2);
        assert_eq!(together.fired.len(), 1);
        assert_eq!(together.fired[0].transitions.len(), 2);

        let config = RunConfig {
            batch_max: 1,
            ..seeded(SelectionPolicy::Maximal)
        };
        let limited = Simulator::new(build(document), config).run();
        assert_eq!(limited.steps, 2);
        assert_eq!(limited.fired.len(), 2);
        assert_eq!(limited.fired[1].step, 2);
    }

    #[test]
    fn maximal_batches_count_every_firing_against_the_budget() {
        let model = build(
            NetDocument::new()
                .with_place("p1", 10)
                .with_place("p2", 10)
                .with_transition("ta")
                .with_transition("tb")
                .with_arc("p1", "ta", 1)
                .with_arc("p2", "tb", 1),
        );
        let config = RunConfig {
            max_steps: 3,
            seed: Some(1),
            ..seeded(SelectionPolicy::Maximal)
        };
        let outcome = Simulator::new(model, config).run();

        let firings: usize = outcome.fired.iter().map(|f| f.transitions.len()).sum();
        assert_eq!(outcome.termination, Termination::StepBudget);
        assert_eq!(outcome.steps, 3);
        assert_eq!(firings, 3);
        assert_eq!(outcome.fired.len(), 2);
        let left = outcome.model.tokens("p1").unwrap() + outcome.model.tokens("p2").unwrap();
        assert_eq!(left, 17);
    }

    #[test]
    fn isolated_transitions_are_never_fired() {
        let model = build(NetDocument::new().with_place("p", 0).with_transition("idle"));
        let mut simulator = Simulator::new(model, seeded(SelectionPolicy::Single));

        assert!(simulator.is_deadlocked());
        assert_eq!(simulator.step(), None);
        assert_eq!(simulator.steps(), 0);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(SelectionPolicy::parse("Maximal"), Some(SelectionPolicy::Maximal));
        assert_eq!(SelectionPolicy::parse("single"), Some(SelectionPolicy::Single));
        assert_eq!(SelectionPolicy::parse("all"), None);
    }
}

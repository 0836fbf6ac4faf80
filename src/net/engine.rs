//! Execution semantics: enablement, firing and the step-bounded reachability
//! search.
//!
//! For a marking `M`, transition `t` is enabled iff `M[p] ≥ w` for every
//! input arc `(p, t, w)`. Firing yields `M'` where every input place loses
//! `w` (floored at 0) and then every output place gains `w` (capped at the
//! model's token cap). Nothing here mutates a model or performs I/O.
use indexmap::IndexSet;
use serde::Serialize;
use thiserror::Error;

use crate::net::ids::TransitionIdx;
use crate::net::model::NetModel;
use crate::net::structure::{Marking, Transition, Weight};

/// Iteration budget used by [`NetModel::reachable_markings`] when the caller
/// has no preference.
pub const DEFAULT_MAX_STEPS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    #[error("transition {0} is not part of the net")]
    UnknownTransition(String),
    #[error("transition {0} is not enabled under the current marking")]
    NotEnabled(String),
}

/// Why a reachability search stopped. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The working marking enables nothing.
    DeadMarking,
    /// An iteration produced no marking that had not been seen before.
    FixedPoint,
    StepBudget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exploration {
    /// Distinct markings in discovery order, starting with the initial one.
    pub markings: Vec<Marking>,
    pub steps: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetStats {
    pub place_count: usize,
    pub transition_count: usize,
    pub arc_count: usize,
    pub total_tokens: Weight,
    pub enabled_transitions: Vec<String>,
    pub is_deadlock: bool,
}

impl NetModel {
    /// Unknown transitions are never enabled; a transition without input arcs
    /// always is.
    pub fn is_enabled(&self, transition_id: &str) -> bool {
        self.transition_idx(transition_id)
            .is_some_and(|t| self.is_enabled_at(t))
    }

    /// Enabled transitions in declaration order.
    pub fn enabled_transitions(&self) -> Vec<&Transition> {
        self.enabled_indices()
            .into_iter()
            .map(|t| self.transition_at(t))
            .collect()
    }

    pub fn is_deadlock(&self) -> bool {
        !self.transition_indices().any(|t| self.is_enabled_at(t))
    }

    /// Fires `transition_id` and returns the successor model.
    pub fn fire(&self, transition_id: &str) -> Result<NetModel, FireError> {
        let t = self
            .transition_idx(transition_id)
            .ok_or_else(|| FireError::UnknownTransition(transition_id.to_owned()))?;
        if !self.is_enabled_at(t) {
            return Err(FireError::NotEnabled(transition_id.to_owned()));
        }
        Ok(self.fire_at(t))
    }

    /// Markings met by the step-bounded search, initial marking first.
    ///
    /// Each iteration fires every enabled transition of the working model,
    /// records the unseen results, and then continues from the last unseen
    /// one only. This follows a single path while sampling every branch along
    /// it; it is not a complete reachability set for branching nets (see
    /// [`crate::analysis::StateGraph`] for that).
    pub fn reachable_markings(&self, max_steps: usize) -> Vec<Marking> {
        self.explore(max_steps).markings
    }

    pub fn explore(&self, max_steps: usize) -> Exploration {
        let mut visited = IndexSet::new();
        visited.insert(self.marking());

        let mut current = self.clone();
        let mut steps = 0;
        let termination = loop {
            if steps >= max_steps {
                break Termination::StepBudget;
            }
            steps += 1;

            let enabled = current.enabled_indices();
            if enabled.is_empty() {
                break Termination::DeadMarking;
            }

            let mut advance = None;
            for t in enabled {
                let candidate = current.fire_at(t);
                if visited.insert(candidate.marking()) {
                    advance = Some(candidate);
                }
            }
            match advance {
                Some(next) => current = next,
                None => break Termination::FixedPoint,
            }
        };

        Exploration {
            markings: visited.into_iter().collect(),
            steps,
            termination,
        }
    }

    pub fn stats(&self) -> NetStats {
        let enabled_transitions: Vec<String> = self
            .enabled_transitions()
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        NetStats {
            place_count: self.places_len(),
            transition_count: self.transitions_len(),
            arc_count: self.arcs_len(),
            total_tokens: self.places().map(|(_, tokens)| tokens).sum(),
            is_deadlock: enabled_transitions.is_empty(),
            enabled_transitions,
        }
    }

    pub(crate) fn enabled_indices(&self) -> Vec<TransitionIdx> {
        self.transition_indices()
            .filter(|&t| self.is_enabled_at(t))
            .collect()
    }

    pub(crate) fn is_enabled_at(&self, transition: TransitionIdx) -> bool {
        self.input_weights(transition)
            .all(|(place, weight)| self.tokens_at(place) >= weight)
    }

    /// Applies the firing rule without checking enablement. All decrements
    /// happen before any increment, so a self-loop place at the cap ends at
    /// `cap - w + w` clamped to the cap.
    pub(crate) fn fire_at(&self, transition: TransitionIdx) -> NetModel {
        let mut tokens = self.token_vector().clone();
        for (place, weight) in self.input_weights(transition) {
            tokens[place] = tokens[place].saturating_sub(weight);
        }
        let cap = self.token_cap();
        for (place, weight) in self.output_weights(transition) {
            tokens[place] = tokens[place].saturating_add(weight).min(cap);
        }
        self.with_tokens(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::diagnostics::Collector;
    use crate::net::document::NetDocument;
    use crate::net::structure::ArcDirection;

    fn build(document: NetDocument) -> NetModel {
        NetModel::from_document(&document, &mut Collector::new())
    }

    fn single_input() -> NetModel {
        build(
            NetDocument::new()
                .with_place("P1", 1)
                .with_transition("T1")
                .with_arc("P1", "T1", 1),
        )
    }

    #[test]
    fn fire_consumes_then_rejects_when_disabled() {
        let model = single_input();
        assert!(model.is_enabled("T1"));

        let fired = model.fire("T1").unwrap();
        assert_eq!(fired.tokens("P1"), Some(0));
        assert_eq!(model.tokens("P1"), Some(1));

        let err = fired.fire("T1").unwrap_err();
        assert_eq!(err, FireError::NotEnabled("T1".into()));
        assert_eq!(fired.tokens("P1"), Some(0));
    }

    #[test]
    fn unknown_transition_is_rejected() {
        let model = single_input();
        assert!(!model.is_enabled("T9"));
        assert_eq!(
            model.fire("T9").unwrap_err(),
            FireError::UnknownTransition("T9".into())
        );
    }

    #[test]
    fn enablement_respects_weights() {
        let model = build(
            NetDocument::new()
                .with_place("p1", 2)
                .with_place("p2", 1)
                .with_transition("t_heavy")
                .with_transition("t_light")
                .with_arc("p1", "t_heavy", 3)
                .with_arc("p1", "t_light", 2)
                .with_arc("p2", "t_light", 1),
        );

        assert!(!model.is_enabled("t_heavy"));
        assert!(model.is_enabled("t_light"));
        let ids: Vec<&str> = model
            .enabled_transitions()
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t_light"]);
    }

    #[test]
    fn output_tokens_saturate_at_the_cap() {
        let mut model = build(
            NetDocument::new()
                .with_place("P1", 0)
                .with_transition("T1")
                .with_arc("T1", "P1", 1),
        );
        for _ in 0..20 {
            model = model.fire("T1").unwrap();
        }
        assert_eq!(model.tokens("P1"), Some(20));

        let again = model.fire("T1").unwrap();
        assert_eq!(again.tokens("P1"), Some(20));
    }

    #[test]
    fn supplied_markings_above_the_cap_are_kept_until_written() {
        let model = build(
            NetDocument::new()
                .with_place("big", 30)
                .with_place("other", 0)
                .with_transition("t")
                .with_arc("t", "other", 1),
        );
        let fired = model.fire("t").unwrap();
        assert_eq!(fired.tokens("big"), Some(30));
        assert_eq!(fired.tokens("other"), Some(1));
    }

    #[test]
    fn self_loop_applies_both_sides() {
        let model = build(
            NetDocument::new()
                .with_place("p", 3)
                .with_place("q", 0)
                .with_transition("t")
                .with_typed_arc("p", "t", 2, ArcDirection::PlaceToTransition)
                .with_typed_arc("t", "p", 1, ArcDirection::TransitionToPlace)
                .with_typed_arc("t", "q", 1, ArcDirection::TransitionToPlace),
        );
        let fired = model.fire("t").unwrap();
        assert_eq!(fired.tokens("p"), Some(2));
        assert_eq!(fired.tokens("q"), Some(1));
        assert_eq!(fired.arcs().count(), model.arcs().count());
    }

    #[test]
    fn custom_token_cap_is_enforced() {
        let model = build(
            NetDocument::new()
                .with_place("p", 0)
                .with_transition("t")
                .with_arc("t", "p", 5),
        )
        .with_token_cap(3);
        assert_eq!(model.fire("t").unwrap().tokens("p"), Some(3));
    }

    #[test]
    fn exploration_reports_fixed_point() {
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
        let exploration = model.explore(10);

        assert_eq!(exploration.termination, Termination::FixedPoint);
        assert_eq!(exploration.steps, 2);
        assert_eq!(
            exploration.markings,
            vec![
                [("P1", 1), ("P2", 0)].into_iter().collect::<Marking>(),
                [("P1", 0), ("P2", 1)].into_iter().collect::<Marking>(),
            ]
        );
    }

    #[test]
    fn exploration_stops_on_dead_marking() {
        let exploration = single_input().explore(DEFAULT_MAX_STEPS);
        assert_eq!(exploration.termination, Termination::DeadMarking);
        assert_eq!(exploration.steps, 2);
        assert_eq!(exploration.markings.len(), 2);
    }

    #[test]
    fn exploration_honours_the_step_budget() {
        let model = build(
            NetDocument::new()
                .with_place("P1", 0)
                .with_transition("T1")
                .with_arc("T1", "P1", 1),
        );
        let exploration = model.explore(5);
        assert_eq!(exploration.termination, Termination::StepBudget);
        assert_eq!(exploration.steps, 5);
        assert_eq!(exploration.markings.len(), 6);

        let nothing = model.explore(0);
        assert_eq!(nothing.markings, vec![model.marking()]);
        assert_eq!(nothing.termination, Termination::StepBudget);
    }

    #[test]
    fn exploration_advances_along_the_last_new_candidate() {
        // From {a:1}: t_b gives {b:1}, t_c gives {c:1}; the search continues
        // from {c:1} only, so {d:1} (reachable via b) is never seen.
        let model = build(
            NetDocument::new()
                .with_place("pa", 1)
                .with_place("pb", 0)
                .with_place("pc", 0)
                .with_place("pd", 0)
                .with_transition("t_b")
                .with_transition("t_c")
                .with_transition("t_d")
                .with_arc("pa", "t_b", 1)
                .with_arc("t_b", "pb", 1)
                .with_arc("pa", "t_c", 1)
                .with_arc("t_c", "pc", 1)
                .with_arc("pb", "t_d", 1)
                .with_arc("t_d", "pd", 1),
        );
        let exploration = model.explore(DEFAULT_MAX_STEPS);

        assert_eq!(exploration.markings.len(), 3);
        assert_eq!(exploration.termination, Termination::DeadMarking);
        assert!(
            exploration
                .markings
                .iter()
                .all(|marking| marking.tokens("pd") == Some(0))
        );
    }

    #[test]
    fn stats_summarize_the_marking() {
        let stats = single_input().stats();
        assert_eq!(stats.place_count, 1);
        assert_eq!(stats.arc_count, 1);
        assert_eq!(stats.total_tokens, 1);
        assert_eq!(stats.enabled_transitions, vec!["T1".to_owned()]);
        assert!(!stats.is_deadlock);
        assert!(single_input().fire("T1").unwrap().is_deadlock());
    }
}

//! The immutable net snapshot the engine operates on.
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync;

use serde::Serialize;
use smallvec::SmallVec;

use crate::net::diagnostics::{DiagnosticSink, Warning};
use crate::net::document::{ArcRecord, NetDocument, PlaceRecord, TransitionRecord};
use crate::net::ids::{ArcIdx, PlaceIdx, TransitionIdx};
use crate::net::index_vec::IndexVec;
use crate::net::resolve::{self, NodeCatalog, Resolution};
use crate::net::structure::{
    Arc, ArcDirection, DEFAULT_TOKEN_CAP, Marking, NodeKind, Place, Transition, Weight,
};

type Adjacency = SmallVec<[(PlaceIdx, ArcIdx); 4]>;

/// Everything about a net except its token counts. Shared between a model
/// and every model derived from it by firing.
struct Topology {
    places: IndexVec<PlaceIdx, Place>,
    transitions: IndexVec<TransitionIdx, Transition>,
    arcs: IndexVec<ArcIdx, Arc>,
    place_index: HashMap<String, PlaceIdx>,
    transition_index: HashMap<String, TransitionIdx>,
    inputs: IndexVec<TransitionIdx, Adjacency>,
    outputs: IndexVec<TransitionIdx, Adjacency>,
    excluded: Vec<ArcIdx>,
}

/// A place/transition net together with its current marking.
///
/// Models are values: firing returns a new model and never touches `self`.
#[derive(Clone)]
pub struct NetModel {
    topology: sync::Arc<Topology>,
    tokens: IndexVec<PlaceIdx, Weight>,
    token_cap: Weight,
}

/// One side of a transition: the adjacent place, its current tokens and the
/// connecting arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint<'a> {
    pub place: &'a Place,
    pub tokens: Weight,
    pub arc: &'a Arc,
}

impl NetModel {
    /// Normalizes a document into a model.
    ///
    /// Malformed records never abort construction; each one is reported to
    /// `sink` and either skipped (places, transitions, incomplete arcs) or kept
    /// but excluded from adjacency (unclassifiable arcs, dangling endpoints).
    pub fn from_document(document: &NetDocument, sink: &mut dyn DiagnosticSink) -> Self {
        let mut places: IndexVec<PlaceIdx, Place> = IndexVec::with_capacity(document.places.len());
        let mut tokens: IndexVec<PlaceIdx, Weight> = IndexVec::with_capacity(document.places.len());
        let mut place_index: HashMap<String, PlaceIdx> = HashMap::new();
        for (index, record) in document.places.iter().enumerate() {
            let Some(id) = record_id(record.id.as_deref(), NodeKind::Place, index, sink) else {
                continue;
            };
            match place_index.entry(id.to_owned()) {
                Entry::Occupied(_) => sink.report(Warning::DuplicateId {
                    kind: NodeKind::Place,
                    id: id.to_owned(),
                }),
                Entry::Vacant(slot) => {
                    let idx = places.push(Place {
                        id: id.to_owned(),
                        attributes: record.extra.clone(),
                    });
                    tokens.push(initial_tokens(id, record, sink));
                    slot.insert(idx);
                }
            }
        }

        let mut transitions: IndexVec<TransitionIdx, Transition> =
            IndexVec::with_capacity(document.transitions.len());
        let mut transition_index: HashMap<String, TransitionIdx> = HashMap::new();
        for (index, record) in document.transitions.iter().enumerate() {
            let Some(id) = record_id(record.id.as_deref(), NodeKind::Transition, index, sink)
            else {
                continue;
            };
            match transition_index.entry(id.to_owned()) {
                Entry::Occupied(_) => sink.report(Warning::DuplicateId {
                    kind: NodeKind::Transition,
                    id: id.to_owned(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert(transitions.push(Transition {
                        id: id.to_owned(),
                        attributes: record.extra.clone(),
                    }));
                }
            }
        }

        let catalog = NodeCatalog::new(
            places.iter().map(|p| p.id.as_str()),
            transitions.iter().map(|t| t.id.as_str()),
        );
        let mut arcs: IndexVec<ArcIdx, Arc> = IndexVec::with_capacity(document.arcs.len());
        let mut inputs: IndexVec<TransitionIdx, Adjacency> =
            transitions.iter().map(|_| Adjacency::new()).collect();
        let mut outputs: IndexVec<TransitionIdx, Adjacency> =
            transitions.iter().map(|_| Adjacency::new()).collect();
        let mut excluded = Vec::new();

        for (index, record) in document.arcs.iter().enumerate() {
            let (Some(from), Some(to)) = (record.source_ref(), record.target_ref()) else {
                sink.report(Warning::IncompleteArc { index });
                continue;
            };
            let label = record
                .id
                .clone()
                .unwrap_or_else(|| format!("{from}->{to}"));
            let weight = arc_weight(&label, record, sink);

            let resolution = resolve::resolve(record, from, to, &catalog);
            match resolution {
                Resolution::Unresolvable => sink.report(Warning::UnresolvableArc {
                    arc: label.clone(),
                    from: from.to_owned(),
                    to: to.to_owned(),
                }),
                Resolution::SameKind => sink.report(Warning::SameKindArc {
                    arc: label.clone(),
                    from: from.to_owned(),
                    to: to.to_owned(),
                }),
                Resolution::Explicit(_) | Resolution::Inferred(_) => {}
            }

            let arc = Arc {
                id: record.id.clone(),
                source: from.to_owned(),
                target: to.to_owned(),
                weight,
                direction: resolution.direction(),
                attributes: record.extra.clone(),
            };
            let endpoints = endpoints_of(&arc, &place_index, &transition_index, &label, sink);
            let arc_idx = arcs.push(arc);
            match (resolution.direction(), endpoints) {
                (Some(ArcDirection::PlaceToTransition), Some((place, transition))) => {
                    inputs[transition].push((place, arc_idx));
                }
                (Some(ArcDirection::TransitionToPlace), Some((place, transition))) => {
                    outputs[transition].push((place, arc_idx));
                }
                _ => excluded.push(arc_idx),
            }
        }

        let topology = Topology {
            places,
            transitions,
            arcs,
            place_index,
            transition_index,
            inputs,
            outputs,
            excluded,
        };
        Self {
            topology: sync::Arc::new(topology),
            tokens,
            token_cap: DEFAULT_TOKEN_CAP,
        }
    }

    /// Overrides the per-place bound enforced by firing.
    pub fn with_token_cap(mut self, token_cap: Weight) -> Self {
        self.token_cap = token_cap;
        self
    }

    pub fn token_cap(&self) -> Weight {
        self.token_cap
    }

    pub fn places_len(&self) -> usize {
        self.topology.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.topology.transitions.len()
    }

    pub fn arcs_len(&self) -> usize {
        self.topology.arcs.len()
    }

    /// Places in declaration order with their current tokens.
    pub fn places(&self) -> impl Iterator<Item = (&Place, Weight)> {
        self.topology
            .places
            .iter_enumerated()
            .map(|(idx, place)| (place, self.tokens[idx]))
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.topology.transitions.iter()
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.topology.arcs.iter()
    }

    pub fn place(&self, id: &str) -> Option<&Place> {
        self.place_idx(id).map(|idx| &self.topology.places[idx])
    }

    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transition_idx(id)
            .map(|idx| &self.topology.transitions[idx])
    }

    pub fn tokens(&self, place_id: &str) -> Option<Weight> {
        self.place_idx(place_id).map(|idx| self.tokens[idx])
    }

    /// Input side of a transition: arcs of type place-to-transition targeting
    /// it whose place exists. Unknown transitions have no inputs.
    pub fn inputs_of(&self, transition_id: &str) -> Vec<Endpoint<'_>> {
        self.transition_idx(transition_id)
            .map(|t| self.endpoints(&self.topology.inputs[t]))
            .unwrap_or_default()
    }

    pub fn outputs_of(&self, transition_id: &str) -> Vec<Endpoint<'_>> {
        self.transition_idx(transition_id)
            .map(|t| self.endpoints(&self.topology.outputs[t]))
            .unwrap_or_default()
    }

    /// Arcs that take part in no enablement or firing, because their
    /// direction could not be resolved or an endpoint does not exist.
    pub fn excluded_arcs(&self) -> impl Iterator<Item = &Arc> {
        self.topology
            .excluded
            .iter()
            .map(|&idx| &self.topology.arcs[idx])
    }

    pub fn marking(&self) -> Marking {
        self.places().map(|(place, tokens)| (place.id.as_str(), tokens)).collect()
    }

    /// Re-inserts a marking. Places missing from `marking` keep their tokens;
    /// ids that are not places of this net are ignored.
    pub fn with_marking(&self, marking: &Marking) -> NetModel {
        let mut next = self.clone();
        for (place_id, tokens) in marking.iter() {
            if let Some(idx) = self.place_idx(place_id) {
                next.tokens[idx] = tokens;
            }
        }
        next
    }

    /// Serializes back into the document shape, materializing the resolved
    /// `type` of every classified arc.
    pub fn to_document(&self) -> NetDocument {
        let places = self
            .places()
            .map(|(place, tokens)| PlaceRecord {
                id: Some(place.id.clone()),
                tokens: Some(i64::try_from(tokens).unwrap_or(i64::MAX)),
                extra: place.attributes.clone(),
            })
            .collect();
        let transitions = self
            .transitions()
            .map(|transition| TransitionRecord {
                id: Some(transition.id.clone()),
                extra: transition.attributes.clone(),
            })
            .collect();
        let arcs = self
            .arcs()
            .map(|arc| ArcRecord {
                id: arc.id.clone(),
                source: Some(arc.source.clone()),
                target: Some(arc.target.clone()),
                weight: Some(i64::try_from(arc.weight).unwrap_or(i64::MAX)),
                kind: arc.direction.map(|d| d.as_str().to_owned()),
                extra: arc.attributes.clone(),
                ..ArcRecord::default()
            })
            .collect();
        NetDocument {
            places,
            transitions,
            arcs,
        }
    }

    /// Structural sanity report: nodes without arcs, transitions that can
    /// never consume or never produce, and places nothing can ever mark.
    pub fn diagnose_connectivity(&self) -> ConnectivityReport {
        let topology = &self.topology;
        let mut consumed: IndexVec<PlaceIdx, bool> = topology.places.iter().map(|_| false).collect();
        let mut produced: IndexVec<PlaceIdx, bool> = topology.places.iter().map(|_| false).collect();
        let mut report = ConnectivityReport::default();

        for (t, transition) in topology.transitions.iter_enumerated() {
            let inputs = &topology.inputs[t];
            let outputs = &topology.outputs[t];
            for &(place, _) in inputs {
                consumed[place] = true;
            }
            for &(place, _) in outputs {
                produced[place] = true;
            }
            match (inputs.is_empty(), outputs.is_empty()) {
                (true, true) => report.isolated_transitions.push(transition.id.clone()),
                (true, false) => report.source_transitions.push(transition.id.clone()),
                (false, true) => report.sink_transitions.push(transition.id.clone()),
                (false, false) => {}
            }
        }

        for (p, place) in topology.places.iter_enumerated() {
            if !consumed[p] && !produced[p] {
                report.isolated_places.push(place.id.clone());
            } else if !produced[p] && self.tokens[p] == 0 {
                report.starved_places.push(place.id.clone());
            }
        }
        report.excluded_arcs = self.excluded_arcs().map(Arc::label).collect();
        report
    }

    pub(crate) fn place_idx(&self, id: &str) -> Option<PlaceIdx> {
        self.topology.place_index.get(id).copied()
    }

    pub(crate) fn transition_idx(&self, id: &str) -> Option<TransitionIdx> {
        self.topology.transition_index.get(id).copied()
    }

    pub(crate) fn transition_at(&self, idx: TransitionIdx) -> &Transition {
        &self.topology.transitions[idx]
    }

    pub(crate) fn transition_indices(&self) -> impl Iterator<Item = TransitionIdx> {
        self.topology.transitions.indices()
    }

    /// `(place, weight)` pairs consumed by `transition`.
    pub(crate) fn input_weights(
        &self,
        transition: TransitionIdx,
    ) -> impl Iterator<Item = (PlaceIdx, Weight)> + '_ {
        self.weights(&self.topology.inputs[transition])
    }

    pub(crate) fn output_weights(
        &self,
        transition: TransitionIdx,
    ) -> impl Iterator<Item = (PlaceIdx, Weight)> + '_ {
        self.weights(&self.topology.outputs[transition])
    }

    pub(crate) fn tokens_at(&self, place: PlaceIdx) -> Weight {
        self.tokens[place]
    }

    /// Same topology, new token vector.
    pub(crate) fn with_tokens(&self, tokens: IndexVec<PlaceIdx, Weight>) -> NetModel {
        NetModel {
            topology: sync::Arc::clone(&self.topology),
            tokens,
            token_cap: self.token_cap,
        }
    }

    pub(crate) fn token_vector(&self) -> &IndexVec<PlaceIdx, Weight> {
        &self.tokens
    }

    fn weights<'a>(
        &'a self,
        adjacency: &'a Adjacency,
    ) -> impl Iterator<Item = (PlaceIdx, Weight)> + 'a {
        adjacency
            .iter()
            .map(|&(place, arc)| (place, self.topology.arcs[arc].weight))
    }

    fn endpoints(&self, adjacency: &Adjacency) -> Vec<Endpoint<'_>> {
        adjacency
            .iter()
            .map(|&(place, arc)| Endpoint {
                place: &self.topology.places[place],
                tokens: self.tokens[place],
                arc: &self.topology.arcs[arc],
            })
            .collect()
    }
}

impl fmt::Debug for NetModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetModel")
            .field("marking", &self.marking())
            .field("transitions", &self.topology.transitions)
            .field("arcs", &self.topology.arcs.len())
            .field("token_cap", &self.token_cap)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub isolated_places: Vec<String>,
    pub isolated_transitions: Vec<String>,
    /// Transitions without inputs; always enabled.
    pub source_transitions: Vec<String>,
    pub sink_transitions: Vec<String>,
    /// Empty places no transition produces into.
    pub starved_places: Vec<String>,
    pub excluded_arcs: Vec<String>,
}

impl ConnectivityReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_places.is_empty()
            || !self.isolated_transitions.is_empty()
            || !self.starved_places.is_empty()
            || !self.excluded_arcs.is_empty()
    }
}

fn record_id<'a>(
    id: Option<&'a str>,
    kind: NodeKind,
    index: usize,
    sink: &mut dyn DiagnosticSink,
) -> Option<&'a str> {
    match id {
        Some(id) if !id.is_empty() => Some(id),
        _ => {
            sink.report(Warning::MissingId { kind, index });
            None
        }
    }
}

fn initial_tokens(id: &str, record: &PlaceRecord, sink: &mut dyn DiagnosticSink) -> Weight {
    match record.tokens {
        None => 0,
        Some(tokens) if tokens < 0 => {
            sink.report(Warning::NegativeTokens {
                place: id.to_owned(),
                tokens,
            });
            0
        }
        Some(tokens) => tokens as Weight,
    }
}

fn arc_weight(label: &str, record: &ArcRecord, sink: &mut dyn DiagnosticSink) -> Weight {
    match record.weight {
        None => 1,
        Some(weight) if weight < 1 => {
            sink.report(Warning::InvalidWeight {
                arc: label.to_owned(),
                weight,
            });
            1
        }
        Some(weight) => weight as Weight,
    }
}

/// Looks up the place and transition a classified arc connects, reporting
/// whichever side is missing.
fn endpoints_of(
    arc: &Arc,
    place_index: &HashMap<String, PlaceIdx>,
    transition_index: &HashMap<String, TransitionIdx>,
    label: &str,
    sink: &mut dyn DiagnosticSink,
) -> Option<(PlaceIdx, TransitionIdx)> {
    let (place_id, transition_id) = (arc.place_id()?, arc.transition_id()?);
    let place = place_index.get(place_id).copied();
    if place.is_none() {
        sink.report(Warning::MissingEndpoint {
            arc: label.to_owned(),
            kind: NodeKind::Place,
            id: place_id.to_owned(),
        });
    }
    let transition = transition_index.get(transition_id).copied();
    if transition.is_none() {
        sink.report(Warning::MissingEndpoint {
            arc: label.to_owned(),
            kind: NodeKind::Transition,
            id: transition_id.to_owned(),
        });
    }
    Some((place?, transition?))
}

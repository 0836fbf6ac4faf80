//! Arc direction resolution for records that may lack explicit typing.
//!
//! Priority: endpoint role hints (`sourceType`/`targetType`), then the
//! `type` field, then place membership of the endpoints, then identifier
//! naming conventions. Anything left over is unresolvable.
use std::collections::HashSet;

use crate::net::document::ArcRecord;
use crate::net::structure::{ArcDirection, NodeKind};

/// Outcome of classifying one arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Explicit(ArcDirection),
    Inferred(ArcDirection),
    /// Both endpoints are known places, or both are known transitions.
    SameKind,
    Unresolvable,
}

impl Resolution {
    pub fn direction(self) -> Option<ArcDirection> {
        match self {
            Resolution::Explicit(direction) | Resolution::Inferred(direction) => Some(direction),
            Resolution::SameKind | Resolution::Unresolvable => None,
        }
    }
}

/// Known node ids of the model being built.
#[derive(Debug, Default)]
pub struct NodeCatalog<'a> {
    places: HashSet<&'a str>,
    transitions: HashSet<&'a str>,
}

impl<'a> NodeCatalog<'a> {
    pub fn new(
        places: impl IntoIterator<Item = &'a str>,
        transitions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            places: places.into_iter().collect(),
            transitions: transitions.into_iter().collect(),
        }
    }

    pub fn is_place(&self, id: &str) -> bool {
        self.places.contains(id)
    }

    pub fn is_transition(&self, id: &str) -> bool {
        self.transitions.contains(id)
    }
}

pub fn resolve(record: &ArcRecord, from: &str, to: &str, catalog: &NodeCatalog<'_>) -> Resolution {
    if let Some(direction) = explicit_direction(record) {
        return Resolution::Explicit(direction);
    }
    infer_direction(from, to, catalog)
}

/// Role hints beat the `type` field. One hint is enough; contradicting hints
/// are ignored.
pub fn explicit_direction(record: &ArcRecord) -> Option<ArcDirection> {
    let by_source = record.source_role().map(|role| match role {
        NodeKind::Place => ArcDirection::PlaceToTransition,
        NodeKind::Transition => ArcDirection::TransitionToPlace,
    });
    let by_target = record.target_role().map(|role| match role {
        NodeKind::Transition => ArcDirection::PlaceToTransition,
        NodeKind::Place => ArcDirection::TransitionToPlace,
    });

    let from_roles = match (by_source, by_target) {
        (Some(a), Some(b)) if a == b => Some(a),
        (Some(a), None) | (None, Some(a)) => Some(a),
        _ => None,
    };
    from_roles.or_else(|| record.declared_type())
}

pub fn infer_direction(from: &str, to: &str, catalog: &NodeCatalog<'_>) -> Resolution {
    match (catalog.is_place(from), catalog.is_place(to)) {
        (true, false) => return Resolution::Inferred(ArcDirection::PlaceToTransition),
        (false, true) => return Resolution::Inferred(ArcDirection::TransitionToPlace),
        (true, true) => return Resolution::SameKind,
        (false, false) => {}
    }
    if catalog.is_transition(from) && catalog.is_transition(to) {
        return Resolution::SameKind;
    }

    if looks_like_place(from) && looks_like_transition(to) {
        Resolution::Inferred(ArcDirection::PlaceToTransition)
    } else if looks_like_transition(from) && looks_like_place(to) {
        Resolution::Inferred(ArcDirection::TransitionToPlace)
    } else {
        Resolution::Unresolvable
    }
}

fn looks_like_place(id: &str) -> bool {
    let lower = id.to_ascii_lowercase();
    lower.starts_with('p') || lower.contains("place")
}

fn looks_like_transition(id: &str) -> bool {
    let lower = id.to_ascii_lowercase();
    lower.starts_with('t') || lower.contains("transition")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> NodeCatalog<'static> {
        NodeCatalog::default()
    }

    #[test]
    fn naming_convention_resolves_without_membership() {
        assert_eq!(
            infer_direction("place-1", "transition-1", &empty()),
            Resolution::Inferred(ArcDirection::PlaceToTransition)
        );
        assert_eq!(
            infer_direction("t1", "p1", &empty()),
            Resolution::Inferred(ArcDirection::TransitionToPlace)
        );
        assert_eq!(
            infer_direction("Buffer", "Consume", &empty()),
            Resolution::Unresolvable
        );
        assert_eq!(infer_direction("p1", "p2", &empty()), Resolution::Unresolvable);
    }

    #[test]
    fn membership_beats_naming() {
        let catalog = NodeCatalog::new(["t_buffer"], ["p_consume"]);
        assert_eq!(
            infer_direction("t_buffer", "p_consume", &catalog),
            Resolution::Inferred(ArcDirection::PlaceToTransition)
        );
        assert_eq!(
            infer_direction("p_consume", "t_buffer", &catalog),
            Resolution::Inferred(ArcDirection::TransitionToPlace)
        );
    }

    #[test]
    fn same_kind_endpoints_are_rejected() {
        let catalog = NodeCatalog::new(["a", "b"], ["x", "y"]);
        assert_eq!(infer_direction("a", "b", &catalog), Resolution::SameKind);
        assert_eq!(infer_direction("x", "y", &catalog), Resolution::SameKind);
    }

    #[test]
    fn role_hints_take_precedence_over_type() {
        let record = ArcRecord {
            kind: Some("transition-to-place".into()),
            source_type: Some("place".into()),
            ..ArcRecord::default()
        };
        assert_eq!(
            explicit_direction(&record),
            Some(ArcDirection::PlaceToTransition)
        );

        let contradicting = ArcRecord {
            kind: Some("transition-to-place".into()),
            source_type: Some("place".into()),
            target_type: Some("place".into()),
            ..ArcRecord::default()
        };
        assert_eq!(
            explicit_direction(&contradicting),
            Some(ArcDirection::TransitionToPlace)
        );

        assert_eq!(explicit_direction(&ArcRecord::default()), None);
    }

    #[test]
    fn explicit_type_skips_inference() {
        let record = ArcRecord {
            kind: Some("place-to-transition".into()),
            ..ArcRecord::default()
        };
        assert_eq!(
            resolve(&record, "Buffer", "Consume", &empty()),
            Resolution::Explicit(ArcDirection::PlaceToTransition)
        );
    }
}

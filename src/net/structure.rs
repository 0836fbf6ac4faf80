//! Static net elements (places, transitions, arcs) and the marking value type.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type Weight = u64;

/// Upper bound written into a place by firing unless the model overrides it.
pub const DEFAULT_TOKEN_CAP: Weight = 20;

/// Opaque record fields the engine carries through untouched (labels,
/// positions, editor metadata).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

#[derive(Clone, PartialEq, Debug)]
pub struct Place {
    pub id: String,
    pub attributes: Attributes,
}

#[derive(Clone, PartialEq)]
pub struct Transition {
    pub id: String,
    pub attributes: Attributes,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transition").field(&self.id).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArcDirection {
    PlaceToTransition,
    TransitionToPlace,
}

impl ArcDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ArcDirection::PlaceToTransition => "place-to-transition",
            ArcDirection::TransitionToPlace => "transition-to-place",
        }
    }

    /// Parses the `type` spelling used by net documents.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "place-to-transition" => Some(ArcDirection::PlaceToTransition),
            "transition-to-place" => Some(ArcDirection::TransitionToPlace),
            _ => None,
        }
    }
}

impl fmt::Display for ArcDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint role hint (`sourceType` / `targetType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Place,
    Transition,
}

impl NodeKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "place" => Some(NodeKind::Place),
            "transition" => Some(NodeKind::Transition),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Place => f.write_str("place"),
            NodeKind::Transition => f.write_str("transition"),
        }
    }
}

/// A normalized arc. `direction` is `None` when the endpoints could not be
/// classified; such arcs never take part in enablement or firing.
#[derive(Clone, PartialEq, Debug)]
pub struct Arc {
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    pub weight: Weight,
    pub direction: Option<ArcDirection>,
    pub attributes: Attributes,
}

impl Arc {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        weight: Weight,
        direction: Option<ArcDirection>,
    ) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            weight,
            direction,
            attributes: Attributes::new(),
        }
    }

    /// Human readable handle: the arc id, or `source->target` for synthesized arcs.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}->{}", self.source, self.target),
        }
    }

    pub fn place_id(&self) -> Option<&str> {
        match self.direction? {
            ArcDirection::PlaceToTransition => Some(self.source.as_str()),
            ArcDirection::TransitionToPlace => Some(self.target.as_str()),
        }
    }

    pub fn transition_id(&self) -> Option<&str> {
        match self.direction? {
            ArcDirection::PlaceToTransition => Some(self.target.as_str()),
            ArcDirection::TransitionToPlace => Some(self.source.as_str()),
        }
    }
}

/// Token distribution keyed by place id.
///
/// Backed by a sorted map, so two markings compare, hash and order by their
/// canonical `(place id, tokens)` sequence regardless of how they were built.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marking(BTreeMap<String, Weight>);

impl Marking {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self, place: &str) -> Option<Weight> {
        self.0.get(place).copied()
    }

    pub fn set(&mut self, place: impl Into<String>, tokens: Weight) -> Option<Weight> {
        self.0.insert(place.into(), tokens)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Weight)> {
        self.0.iter().map(|(place, tokens)| (place.as_str(), *tokens))
    }

    /// Sorted `(place id, tokens)` pairs.
    pub fn canonical(&self) -> Vec<(&str, Weight)> {
        self.iter().collect()
    }
}

impl<S> FromIterator<(S, Weight)> for Marking
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, Weight)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(place, tokens)| (place.into(), tokens))
                .collect(),
        )
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (pos, (place, tokens)) in self.iter().enumerate() {
            if pos > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{place}: {tokens}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_equality_ignores_insertion_order() {
        let forward: Marking = [("P1", 1), ("P2", 0)].into_iter().collect();
        let mut backward = Marking::new();
        backward.set("P2", 0);
        backward.set("P1", 1);

        assert_eq!(forward, backward);
        assert_eq!(forward.canonical(), vec![("P1", 1), ("P2", 0)]);
        assert_eq!(forward.to_string(), "{P1: 1, P2: 0}");
    }

    #[test]
    fn arc_direction_parses_document_spelling() {
        assert_eq!(
            ArcDirection::parse("Place-To-Transition"),
            Some(ArcDirection::PlaceToTransition)
        );
        assert_eq!(ArcDirection::parse("inhibitor"), None);
    }

    #[test]
    fn arc_endpoints_follow_direction() {
        let arc = Arc::new("t1", "p1", 1, Some(ArcDirection::TransitionToPlace));
        assert_eq!(arc.place_id(), Some("p1"));
        assert_eq!(arc.transition_id(), Some("t1"));
        assert_eq!(arc.label(), "t1->p1");

        let unresolved = Arc::new("a", "b", 1, None);
        assert_eq!(unresolved.place_id(), None);
    }
}

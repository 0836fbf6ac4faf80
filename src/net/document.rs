//! Loosely shaped net records as produced by editors and format converters.
//!
//! Everything here is optional on purpose; [`NetModel::from_document`]
//! is the only place that interprets these records.
//!
//! [`NetModel::from_document`]: crate::net::NetModel::from_document
use serde::{Deserialize, Serialize};

use crate::net::structure::{ArcDirection, Attributes, NodeKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetDocument {
    #[serde(default)]
    pub places: Vec<PlaceRecord>,
    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
    #[serde(default)]
    pub arcs: Vec<ArcRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<i64>,
    #[serde(flatten)]
    pub extra: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl ArcRecord {
    /// `sourceId` wins over `source` when an editor wrote both.
    pub fn source_ref(&self) -> Option<&str> {
        non_empty(self.source_id.as_deref()).or_else(|| non_empty(self.source.as_deref()))
    }

    pub fn target_ref(&self) -> Option<&str> {
        non_empty(self.target_id.as_deref()).or_else(|| non_empty(self.target.as_deref()))
    }

    pub fn source_role(&self) -> Option<NodeKind> {
        self.source_type.as_deref().and_then(NodeKind::parse)
    }

    pub fn target_role(&self) -> Option<NodeKind> {
        self.target_type.as_deref().and_then(NodeKind::parse)
    }

    pub fn declared_type(&self) -> Option<ArcDirection> {
        self.kind.as_deref().and_then(ArcDirection::parse)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl NetDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, id: impl Into<String>, tokens: i64) -> Self {
        self.places.push(PlaceRecord {
            id: Some(id.into()),
            tokens: Some(tokens),
            extra: Attributes::new(),
        });
        self
    }

    pub fn with_transition(mut self, id: impl Into<String>) -> Self {
        self.transitions.push(TransitionRecord {
            id: Some(id.into()),
            extra: Attributes::new(),
        });
        self
    }

    /// Untyped arc; its direction is inferred from the endpoints.
    pub fn with_arc(mut self, source: impl Into<String>, target: impl Into<String>, weight: i64) -> Self {
        self.arcs.push(ArcRecord {
            source: Some(source.into()),
            target: Some(target.into()),
            weight: Some(weight),
            ..ArcRecord::default()
        });
        self
    }

    pub fn with_typed_arc(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        weight: i64,
        direction: ArcDirection,
    ) -> Self {
        self.arcs.push(ArcRecord {
            source: Some(source.into()),
            target: Some(target.into()),
            weight: Some(weight),
            kind: Some(direction.as_str().to_owned()),
            ..ArcRecord::default()
        });
        self
    }
}

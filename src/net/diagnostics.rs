//! Non-fatal anomalies found while normalizing a net document.
//!
//! Ingestion never aborts on a single malformed record: the record is skipped
//! or excluded from adjacency and a [`Warning`] is handed to the
//! [`DiagnosticSink`] supplied by the caller.
use thiserror::Error;

use crate::net::structure::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("arc {arc} ({from} -> {to}) cannot be classified as input or output")]
    UnresolvableArc {
        arc: String,
        from: String,
        to: String,
    },
    #[error("arc {arc} ({from} -> {to}) joins two nodes of the same kind")]
    SameKindArc {
        arc: String,
        from: String,
        to: String,
    },
    #[error("arc {arc} references unknown {kind} {id}")]
    MissingEndpoint {
        arc: String,
        kind: NodeKind,
        id: String,
    },
    #[error("arc #{index} has no source or no target")]
    IncompleteArc { index: usize },
    #[error("arc {arc} has weight {weight}; using 1")]
    InvalidWeight { arc: String, weight: i64 },
    #[error("place {place} has {tokens} tokens; using 0")]
    NegativeTokens { place: String, tokens: i64 },
    #[error("{kind} #{index} has no id")]
    MissingId { kind: NodeKind, index: usize },
    #[error("duplicate {kind} id {id}; later declaration ignored")]
    DuplicateId { kind: NodeKind, id: String },
}

pub trait DiagnosticSink {
    fn report(&mut self, warning: Warning);
}

impl DiagnosticSink for Vec<Warning> {
    fn report(&mut self, warning: Warning) {
        self.push(warning);
    }
}

/// Keeps every warning so callers can inspect them after normalization.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    warnings: Vec<Warning>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

impl DiagnosticSink for Collector {
    fn report(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Forwards warnings to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, warning: Warning) {
        log::warn!("{warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_keeps_reports_in_order() {
        let mut collector = Collector::new();
        collector.report(Warning::IncompleteArc { index: 3 });
        collector.report(Warning::DuplicateId {
            kind: NodeKind::Place,
            id: "p1".into(),
        });

        assert_eq!(collector.warnings().len(), 2);
        assert_eq!(collector.warnings()[0], Warning::IncompleteArc { index: 3 });
        assert_eq!(
            collector.warnings()[1].to_string(),
            "duplicate place id p1; later declaration ignored"
        );
    }
}

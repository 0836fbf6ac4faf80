//! # Place/Transition nets
//!
//! A net has places `P`, transitions `T` and weighted arcs. A marking
//! `M: P → ℕ` is the net's state. For every transition `t`:
//!
//! * `t` is **enabled** iff `M[p] ≥ w` for each input arc `(p, t, w)`;
//! * **firing** `t` removes `w` tokens along each input arc (never below 0)
//!   and adds `w` along each output arc (never above the token cap, 20 by
//!   default).
//!
//! Documents arrive loosely shaped ([`NetDocument`]) and are normalized once
//! into a [`NetModel`]; anomalies are reported to a [`DiagnosticSink`] rather
//! than failing the whole net.
//!
//! ## Example
//!
//! ```rust
//! use ptsim::net::*;
//!
//! let document = NetDocument::new()
//!     .with_place("p0", 1)
//!     .with_place("p1", 0)
//!     .with_transition("t0")
//!     .with_arc("p0", "t0", 1)
//!     .with_arc("t0", "p1", 1);
//! let model = NetModel::from_document(&document, &mut Collector::new());
//!
//! assert!(model.is_enabled("t0"));
//! let next = model.fire("t0").unwrap();
//! assert_eq!(next.tokens("p0"), Some(0));
//! assert_eq!(next.tokens("p1"), Some(1));
//! assert!(matches!(next.fire("t0"), Err(FireError::NotEnabled(_))));
//! ```

pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod ids;
pub mod index_vec;
pub mod io;
pub mod model;
pub mod resolve;
pub mod structure;

pub use diagnostics::{Collector, DiagnosticSink, LogSink, Warning};
pub use document::{ArcRecord, NetDocument, PlaceRecord, TransitionRecord};
pub use engine::{DEFAULT_MAX_STEPS, Exploration, FireError, NetStats, Termination};
pub use ids::{ArcIdx, PlaceIdx, TransitionIdx};
pub use index_vec::{Idx, IndexVec};
pub use model::{ConnectivityReport, Endpoint, NetModel};
pub use structure::{
    Arc, ArcDirection, Attributes, DEFAULT_TOKEN_CAP, Marking, NodeKind, Place, Transition,
    Weight,
};

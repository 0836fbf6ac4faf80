//! Whole-state-space analyses built on top of the firing rule.
pub mod state_graph;

pub use state_graph::{
    StateEdge, StateGraph, StateGraphConfig, StateGraphStats, StateNode, TokenChange,
};

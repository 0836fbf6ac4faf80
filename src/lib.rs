//! Place/Transition net execution and reachability.
//!
//! [`net`] holds the model, the firing rule and the step-bounded reachability
//! search. [`analysis`] builds the complete state graph, [`simulate`] runs
//! randomized token games, and [`config`]/[`options`] back the `pn-sim`
//! binary.
pub mod analysis;
pub mod config;
pub mod net;
pub mod options;
pub mod simulate;

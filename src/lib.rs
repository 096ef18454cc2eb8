//! Headless driver for the settlers simulation.
//!
//! The simulation itself lives in the `settlers_*` crates; this library wires
//! them together for the `settlers` binary: configuration loading, optional
//! snapshot restore, history logging, the advisor, and the extinction policy.

pub mod runner;

pub use runner::{run, AdvisorMode, ExtinctionPolicy, RunOptions, RunSummary};

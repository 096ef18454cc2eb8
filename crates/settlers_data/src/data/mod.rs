//! Core data structures for the settlers simulation.

pub mod agent;
pub mod genome;
pub mod house;
pub mod stats;

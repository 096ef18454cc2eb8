//! Optional action advisor for the settlers simulation.
//!
//! A [`reasoner::ActionReasoner`] answers asynchronously; [`bridge::AsyncAdvisor`]
//! runs it on a tokio task and serves cached answers to the simulation
//! without ever waiting.

pub mod bridge;
pub mod reasoner;

pub use bridge::{AdvisorStats, AsyncAdvisor};
pub use reasoner::{ActionReasoner, AdvisorQuery, HeuristicReasoner, Suggestion};

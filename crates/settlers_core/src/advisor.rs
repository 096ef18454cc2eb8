//! Optional per-agent action override.
//!
//! The world asks the advisor once per agent per tick from inside the parallel
//! decision phase. Implementations must answer immediately from whatever they
//! already know; `None` keeps the network's choice.

use crate::brain::FeatureVector;
use settlers_data::{Action, Agent};

pub trait Advisor: Send + Sync {
    fn suggest_action(&self, agent: &Agent, features: &FeatureVector, tick: u64) -> Option<Action>;

    /// Called once after each committed tick.
    fn end_tick(&self, _tick: u64) {}
}

/// Never overrides anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdvisor;

impl Advisor for NoAdvisor {
    fn suggest_action(&self, _agent: &Agent, _features: &FeatureVector, _tick: u64) -> Option<Action> {
        None
    }
}

impl<A: Advisor + ?Sized> Advisor for std::sync::Arc<A> {
    fn suggest_action(&self, agent: &Agent, features: &FeatureVector, tick: u64) -> Option<Action> {
        (**self).suggest_action(agent, features, tick)
    }

    fn end_tick(&self, tick: u64) {
        (**self).end_tick(tick);
    }
}

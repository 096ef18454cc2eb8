//! Lifecycle notifications for external logging.
//!
//! Observers are fire-and-forget: the world calls them from its commit phase
//! and ignores whatever happens on the other side.

use serde::{Deserialize, Serialize};
use settlers_data::{Agent, AgentId, DeathCause, HouseId, MilestoneKind};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LifecycleEvent {
    Birth {
        agent: AgentId,
        name: String,
        generation: u32,
        parents: Vec<AgentId>,
        tick: u64,
    },
    Death {
        agent: AgentId,
        name: String,
        cause: DeathCause,
        age: f64,
        generation: u32,
        fitness: f64,
        tick: u64,
    },
    Reproduction {
        parents: [AgentId; 2],
        child: AgentId,
        house: HouseId,
        tick: u64,
    },
    Milestone {
        agent: AgentId,
        name: String,
        kind: MilestoneKind,
        tick: u64,
    },
    Reseed {
        count: usize,
        generation: u32,
        tick: u64,
    },
}

impl LifecycleEvent {
    #[must_use]
    pub fn tick(&self) -> u64 {
        match self {
            Self::Birth { tick, .. }
            | Self::Death { tick, .. }
            | Self::Reproduction { tick, .. }
            | Self::Milestone { tick, .. }
            | Self::Reseed { tick, .. } => *tick,
        }
    }
}

/// Receiver of lifecycle notifications.
///
/// Every hook builds a [`LifecycleEvent`] and hands it to [`Self::record`],
/// so most observers only implement that one method.
pub trait LifecycleObserver: Send + Sync {
    fn on_birth(&self, agent: &Agent, tick: u64) {
        self.record(LifecycleEvent::Birth {
            agent: agent.id,
            name: agent.name.clone(),
            generation: agent.generation,
            parents: agent.parents.clone(),
            tick,
        });
    }

    fn on_death(&self, agent: &Agent, cause: DeathCause, fitness: f64, tick: u64) {
        self.record(LifecycleEvent::Death {
            agent: agent.id,
            name: agent.name.clone(),
            cause,
            age: agent.age,
            generation: agent.generation,
            fitness,
            tick,
        });
    }

    fn on_reproduction(&self, parents: [AgentId; 2], child: &Agent, house: HouseId, tick: u64) {
        self.record(LifecycleEvent::Reproduction {
            parents,
            child: child.id,
            house,
            tick,
        });
    }

    fn on_milestone(&self, agent: &Agent, kind: MilestoneKind, tick: u64) {
        self.record(LifecycleEvent::Milestone {
            agent: agent.id,
            name: agent.name.clone(),
            kind,
            tick,
        });
    }

    fn on_reseed(&self, count: usize, generation: u32, tick: u64) {
        self.record(LifecycleEvent::Reseed {
            count,
            generation,
            tick,
        });
    }

    fn record(&self, _event: LifecycleEvent) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl LifecycleObserver for NullObserver {}

/// Collects events in memory; used by tests and the headless runner.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl EventBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all buffered events.
    pub fn drain(&self) -> Vec<LifecycleEvent> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *events)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LifecycleObserver for EventBuffer {
    fn record(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl<O: LifecycleObserver + ?Sized> LifecycleObserver for std::sync::Arc<O> {
    fn on_birth(&self, agent: &Agent, tick: u64) {
        (**self).on_birth(agent, tick);
    }

    fn on_death(&self, agent: &Agent, cause: DeathCause, fitness: f64, tick: u64) {
        (**self).on_death(agent, cause, fitness, tick);
    }

    fn on_reproduction(&self, parents: [AgentId; 2], child: &Agent, house: HouseId, tick: u64) {
        (**self).on_reproduction(parents, child, house, tick);
    }

    fn on_milestone(&self, agent: &Agent, kind: MilestoneKind, tick: u64) {
        (**self).on_milestone(agent, kind, tick);
    }

    fn on_reseed(&self, count: usize, generation: u32, tick: u64) {
        (**self).on_reseed(count, generation, tick);
    }

    fn record(&self, event: LifecycleEvent) {
        (**self).record(event);
    }
}

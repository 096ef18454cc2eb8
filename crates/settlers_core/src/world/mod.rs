//! The simulation world: roster, collaborators and the per-tick pipeline.
//!
//! Each tick runs in two phases. Agents sense, decide, act and age in
//! parallel, each touching only itself and reading collaborator state as it
//! was committed by the previous tick. Shared effects (harvests, house slots,
//! deaths, births) are then committed sequentially in ascending agent-id order.

use crate::advisor::{Advisor, NoAdvisor};
use crate::clock::DayClock;
use crate::config::AppConfig;
use crate::events::{LifecycleObserver, NullObserver};
use crate::evolution::EvolutionEngine;
use crate::interfaces::{ResourceProvider, ShelterRegistry, Terrain};
use crate::metrics::Metrics;
use rand_chacha::ChaCha8Rng;
use settlers_data::{Agent, AgentId, DeathCause, PopulationStats};
use std::sync::Arc;

pub mod finalize;
pub mod init;
pub mod update;

/// Counters owned by the simulation, written only during the commit phase.
#[derive(Debug, Clone)]
pub struct SimContext {
    pub tick: u64,
    pub next_agent_id: u64,
    pub world_seed: u64,
    pub clock: DayClock,
    pub engine: EvolutionEngine,
}

impl SimContext {
    /// Hands out the next agent id.
    pub fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        id
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub births: Vec<AgentId>,
    pub deaths: Vec<(AgentId, DeathCause)>,
    pub reseeded: usize,
    pub malformed_genomes: usize,
    pub advisor_overrides: usize,
    pub population: usize,
}

pub struct World {
    pub config: AppConfig,
    pub ctx: SimContext,
    /// Live agents, sorted by id.
    pub agents: Vec<Agent>,
    pub terrain: Box<dyn Terrain>,
    pub resources: Box<dyn ResourceProvider>,
    pub shelters: Box<dyn ShelterRegistry>,
    pub observer: Arc<dyn LifecycleObserver>,
    pub advisor: Arc<dyn Advisor>,
    pub metrics: Metrics,
    pub pop_stats: PopulationStats,
    pub(crate) rng: ChaCha8Rng,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tick", &self.ctx.tick)
            .field("population", &self.agents.len())
            .field("generation", &self.ctx.engine.current_generation())
            .finish_non_exhaustive()
    }
}

impl World {
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_advisor(mut self, advisor: Arc<dyn Advisor>) -> Self {
        self.advisor = advisor;
        self
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.ctx.tick
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        crate::systems::reproduction::roster_index(&self.agents, id).map(|i| &self.agents[i])
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        crate::systems::reproduction::roster_index(&self.agents, id).map(|i| &mut self.agents[i])
    }

    #[must_use]
    pub fn engine(&self) -> &EvolutionEngine {
        &self.ctx.engine
    }

    #[must_use]
    pub fn clock(&self) -> &DayClock {
        &self.ctx.clock
    }

    pub(crate) fn default_observer() -> Arc<dyn LifecycleObserver> {
        Arc::new(NullObserver)
    }

    pub(crate) fn default_advisor() -> Arc<dyn Advisor> {
        Arc::new(NoAdvisor)
    }
}

/// Seed for an agent's private RNG in a given tick.
///
/// Independent of thread scheduling, so parallel runs stay reproducible.
#[must_use]
pub fn agent_seed(world_seed: u64, tick: u64, agent: AgentId) -> u64 {
    let mut h = world_seed ^ 0x5EED_0000_0000_0000;
    for v in [tick, agent.0] {
        h = h.wrapping_add(v).wrapping_add(0x9E37_79B9_7F4A_7C15);
        h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^= h >> 31;
    }
    h
}

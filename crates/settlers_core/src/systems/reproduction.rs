//! Reproduction coordinator.
//!
//! Gating is deterministic: a house produces a child only when it is full
//! with exactly two living adult occupants whose cooldowns have both elapsed. Any failed
//! precondition leaves every agent untouched.

use crate::config::LifecycleConfig;
use crate::evolution::EvolutionEngine;
use crate::interfaces::{house_occupancy, ShelterRegistry, Terrain};
use crate::lifecycle;
use rand::Rng;
use settlers_data::{Agent, AgentId, HouseId, Position};

/// Children appear within this distance of the house.
pub const BIRTH_SCATTER: f64 = 1.0;

pub struct ReproductionContext<'a, S: ?Sized, T: ?Sized> {
    pub shelters: &'a S,
    pub terrain: &'a T,
    pub engine: &'a EvolutionEngine,
    pub lifecycle: &'a LifecycleConfig,
    pub tick: u64,
}

/// A successful birth.
#[derive(Debug, Clone)]
pub struct Birth {
    pub child: Agent,
    pub parents: [AgentId; 2],
    pub house: HouseId,
}

/// Position of `id` in a roster kept sorted by id.
#[must_use]
pub fn roster_index(agents: &[Agent], id: AgentId) -> Option<usize> {
    agents.binary_search_by_key(&id, |a| a.id).ok()
}

/// Whether `house` currently satisfies every reproduction precondition:
/// full to capacity with exactly two adults whose cooldowns have elapsed.
pub fn is_eligible<S: ShelterRegistry + ?Sized>(
    house: HouseId,
    agents: &[Agent],
    shelters: &S,
) -> Option<(usize, usize)> {
    let occupancy = house_occupancy(shelters, house, |id| {
        roster_index(agents, id).map(|i| agents[i].stage)
    });
    if occupancy.count != 2
        || occupancy.count != shelters.capacity(house)
        || occupancy.stages.len() != occupancy.count
        || !occupancy.all_adults()
    {
        return None;
    }
    let occupants = shelters.occupants(house);
    let ia = roster_index(agents, occupants[0])?;
    let ib = roster_index(agents, occupants[1])?;
    let ready = |i: usize| {
        let a = &agents[i];
        a.is_alive() && a.house == Some(house) && lifecycle::can_reproduce(a)
    };
    (ia != ib && ready(ia) && ready(ib)).then_some((ia, ib))
}

/// Attempts a birth in `house`, assigning the child `child_id`.
///
/// Returns `None`, with no side effects, when the house is not eligible.
/// On success both parents' cooldowns reset and their reproduction counters
/// increase; the caller inserts the child into the roster.
pub fn try_reproduce<S, T, R>(
    house: HouseId,
    agents: &mut [Agent],
    child_id: AgentId,
    ctx: &ReproductionContext<'_, S, T>,
    rng: &mut R,
) -> Option<Birth>
where
    S: ShelterRegistry + ?Sized,
    T: Terrain + ?Sized,
    R: Rng,
{
    let (ia, ib) = is_eligible(house, agents, ctx.shelters)?;
    let home = ctx.shelters.position(house)?;

    let genome = match ctx
        .engine
        .breed_with_rng(&agents[ia].genome, &agents[ib].genome, rng)
    {
        Ok(genome) => genome,
        Err(e) => {
            tracing::warn!(%house, error = %e, "Parents cannot breed");
            return None;
        }
    };

    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let radius = rng.gen_range(0.0..=BIRTH_SCATTER);
    let (x, z) = (home.x + angle.cos() * radius, home.z + angle.sin() * radius);
    let position = Position::new(x, ctx.terrain.height(x, z), z);

    let generation = agents[ia].generation.max(agents[ib].generation) + 1;
    let parents = [agents[ia].id, agents[ib].id];
    let mut child = lifecycle::create_agent(
        child_id,
        genome,
        generation,
        parents.to_vec(),
        position,
        ctx.tick,
    );
    child.heading = angle;

    for i in [ia, ib] {
        let parent = &mut agents[i];
        parent.reproduction_cooldown = ctx.lifecycle.reproduction_cooldown;
        parent.fitness.reproductions += 1;
    }

    tracing::debug!(
        child = %child.id,
        name = %child.name,
        generation,
        %house,
        "Child born"
    );
    Some(Birth {
        child,
        parents,
        house,
    })
}

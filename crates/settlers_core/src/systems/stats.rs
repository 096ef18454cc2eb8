use crate::interfaces::ShelterRegistry;
use settlers_data::{Agent, HouseId, LifeStage, PopulationStats};

pub struct StatsContext<'a, S: ?Sized> {
    pub agents: &'a [Agent],
    pub shelters: &'a S,
    pub generation: u32,
    pub best_fitness: f64,
}

/// Recomputes population figures for the current roster.
pub fn update_population_stats<S: ShelterRegistry + ?Sized>(
    stats: &mut PopulationStats,
    ctx: StatsContext<'_, S>,
) {
    *stats = PopulationStats {
        generation: ctx.generation,
        best_fitness: ctx.best_fitness,
        ..Default::default()
    };

    let mut health = 0.0f32;
    let mut hunger = 0.0f32;
    for agent in ctx.agents.iter().filter(|a| a.is_alive()) {
        stats.population += 1;
        match agent.stage {
            LifeStage::Child => stats.children += 1,
            LifeStage::Adult => stats.adults += 1,
            LifeStage::Elder => stats.elders += 1,
            LifeStage::Dead => {}
        }
        if agent.is_sheltered() {
            stats.sheltered += 1;
        }
        health += agent.stats.health;
        hunger += agent.stats.hunger;
    }
    if stats.population > 0 {
        stats.mean_health = health / stats.population as f32;
        stats.mean_hunger = hunger / stats.population as f32;
    }

    stats.houses_full = ctx
        .shelters
        .house_ids()
        .into_iter()
        .filter(|id| is_full(ctx.shelters, *id))
        .count();
}

fn is_full<S: ShelterRegistry + ?Sized>(shelters: &S, house: HouseId) -> bool {
    let capacity = shelters.capacity(house);
    capacity > 0 && shelters.occupants(house).len() >= capacity
}

use serde::{Deserialize, Serialize};

/// Aggregate population figures for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub population: usize,
    pub children: usize,
    pub adults: usize,
    pub elders: usize,
    pub sheltered: usize,
    pub houses_full: usize,
    pub generation: u32,
    pub best_fitness: f64,
    pub mean_health: f32,
    pub mean_hunger: f32,
}

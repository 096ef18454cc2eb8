//! Sensor assembly: agent state plus world queries into a normalized feature vector.
//!
//! A spatial query that finds nothing is a valid observation. It is encoded
//! as distance `1.0` with direction `(0, 0)`.

use crate::brain::{FeatureVector, NETWORK_INPUTS};
use crate::clock::DayClock;
use crate::config::LifecycleConfig;
use crate::interfaces::{ShelterRegistry, SpatialIndex, Target};
use crate::lifecycle;
use settlers_data::{Agent, TargetKind, STAT_MAX};

pub const HEALTH: usize = 0;
pub const HUNGER: usize = 1;
pub const STAMINA: usize = 2;
pub const AGE: usize = 3;
pub const FOOD_DIST: usize = 4;
pub const FOOD_DIR: usize = 5;
pub const SHELTER_DIST: usize = 7;
pub const SHELTER_DIR: usize = 8;
pub const THREAT_DIST: usize = 10;
pub const THREAT_DIR: usize = 11;
pub const DAY_PHASE: usize = 13;
pub const NIGHT: usize = 14;
pub const EXPOSED: usize = 15;
pub const CAN_REPRODUCE: usize = 16;
pub const SHELTERED: usize = 17;

/// Distance reported when nothing was found.
pub const ABSENT_DISTANCE: f32 = 1.0;

/// Read-only world state an agent senses.
pub struct SenseContext<'a, S: ?Sized, H: ?Sized> {
    pub spatial: &'a S,
    pub shelters: &'a H,
    pub clock: &'a DayClock,
    pub lifecycle: &'a LifecycleConfig,
}

/// Features plus the targets they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub features: FeatureVector,
    pub food: Option<Target>,
    pub shelter: Option<Target>,
    pub threat: Option<Target>,
}

/// Builds the observation for `agent`. Never fails.
pub fn assemble<S, H>(agent: &Agent, ctx: &SenseContext<'_, S, H>) -> Observation
where
    S: SpatialIndex + ?Sized,
    H: ShelterRegistry + ?Sized,
{
    let (x, z) = (agent.position.x, agent.position.z);
    let vision = f64::from(agent.genome.traits.vision_range);
    let shelter_range = ctx.lifecycle.shelter_sense_range;

    let food = locate(agent, ctx.spatial, TargetKind::Food, vision);
    let threat = locate(agent, ctx.spatial, TargetKind::Threat, vision);
    let shelter = ctx
        .shelters
        .nearest_shelter(agent.id, x, z, shelter_range);

    let night = ctx.clock.is_night();
    let sheltered = agent.is_sheltered();

    let mut features = [0.0f32; NETWORK_INPUTS];
    features[HEALTH] = agent.stats.health / STAT_MAX;
    features[HUNGER] = agent.stats.hunger / STAT_MAX;
    features[STAMINA] = agent.stats.stamina / STAT_MAX;
    features[AGE] = if ctx.lifecycle.max_lifespan > 0.0 {
        (agent.age / ctx.lifecycle.max_lifespan).min(1.0) as f32
    } else {
        0.0
    };
    encode_target(&mut features, FOOD_DIST, food, x, z, vision);
    encode_target(&mut features, SHELTER_DIST, shelter, x, z, shelter_range);
    encode_target(&mut features, THREAT_DIST, threat, x, z, vision);
    features[DAY_PHASE] = ctx.clock.phase() as f32;
    features[NIGHT] = flag(night);
    features[EXPOSED] = flag(night && !sheltered);
    features[CAN_REPRODUCE] = flag(lifecycle::can_reproduce(agent));
    features[SHELTERED] = flag(sheltered);

    for f in &mut features {
        *f = if f.is_finite() { f.clamp(-1.0, 1.0) } else { 0.0 };
    }

    Observation {
        features,
        food,
        shelter,
        threat,
    }
}

/// Re-resolves the remembered target of this kind, falling back to a fresh query.
fn locate<S: SpatialIndex + ?Sized>(
    agent: &Agent,
    spatial: &S,
    kind: TargetKind,
    radius: f64,
) -> Option<Target> {
    agent
        .target
        .filter(|t| t.kind == kind)
        .and_then(|t| spatial.resolve(t))
        .filter(|t| t.distance_from(agent.position.x, agent.position.z) <= radius)
        .or_else(|| spatial.nearest(kind, agent.position.x, agent.position.z, radius))
}

fn encode_target(
    features: &mut FeatureVector,
    dist_index: usize,
    target: Option<Target>,
    x: f64,
    z: f64,
    range: f64,
) {
    let (dist, dx, dz) = match target {
        Some(t) if range > 0.0 => {
            let d = t.distance_from(x, z);
            let (dx, dz) = if d > f64::EPSILON {
                ((t.x - x) / d, (t.z - z) / d)
            } else {
                (0.0, 0.0)
            };
            ((d / range).min(1.0) as f32, dx as f32, dz as f32)
        }
        _ => (ABSENT_DISTANCE, 0.0, 0.0),
    };
    features[dist_index] = dist;
    features[dist_index + 1] = dx;
    features[dist_index + 2] = dz;
}

fn flag(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{HouseRegistry, ResourceField, Species};
    use crate::interfaces::FoodSupply;
    use crate::test_support::agent_at;
    use settlers_data::{Position, TargetRef};

    fn context<'a>(
        field: &'a ResourceField,
        houses: &'a HouseRegistry,
        clock: &'a DayClock,
        config: &'a LifecycleConfig,
    ) -> SenseContext<'a, ResourceField, HouseRegistry> {
        SenseContext {
            spatial: field,
            shelters: houses,
            clock,
            lifecycle: config,
        }
    }

    #[test]
    fn test_starving_agent_without_food_gets_sentinel() {
        let mut agent = agent_at(1, 0.0, 0.0);
        agent.stats.hunger = 100.0;
        let field = ResourceField::new(10.0);
        let houses = HouseRegistry::new();
        let clock = DayClock::starting_at_hour(120.0, 12.0);
        let config = LifecycleConfig::default();

        let obs = assemble(&agent, &context(&field, &houses, &clock, &config));
        assert_eq!(obs.features[HUNGER], 1.0);
        assert_eq!(obs.features[FOOD_DIST], ABSENT_DISTANCE);
        assert_eq!(obs.features[FOOD_DIR], 0.0);
        assert_eq!(obs.features[FOOD_DIR + 1], 0.0);
        assert!(obs.food.is_none());
        assert_eq!(obs.features[NIGHT], 0.0);
    }

    #[test]
    fn test_direction_is_unit_and_distance_normalized() {
        let agent = agent_at(1, 0.0, 0.0);
        let mut field = ResourceField::new(10.0);
        field.add_food(3.0, 4.0, 2);
        let houses = HouseRegistry::new();
        let clock = DayClock::default();
        let config = LifecycleConfig::default();

        let obs = assemble(&agent, &context(&field, &houses, &clock, &config));
        let vision = agent.genome.traits.vision_range;
        assert!((obs.features[FOOD_DIST] - 5.0 / vision).abs() < 1e-6);
        assert!((obs.features[FOOD_DIR] - 0.6).abs() < 1e-6);
        assert!((obs.features[FOOD_DIR + 1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_night_outdoors_is_exposed() {
        let agent = agent_at(1, 0.0, 0.0);
        let field = ResourceField::new(10.0);
        let mut houses = HouseRegistry::new();
        houses.add_house(Position::new(10.0, 0.0, 0.0), 2);
        let clock = DayClock::starting_at_hour(120.0, 2.0);
        let config = LifecycleConfig::default();

        let obs = assemble(&agent, &context(&field, &houses, &clock, &config));
        assert_eq!(obs.features[NIGHT], 1.0);
        assert_eq!(obs.features[EXPOSED], 1.0);
        assert_eq!(obs.features[SHELTERED], 0.0);
        assert!(obs.shelter.is_some());
        assert_eq!(obs.features[SHELTER_DIR], 1.0);
    }

    #[test]
    fn test_features_stay_in_range() {
        let mut agent = agent_at(1, 0.0, 0.0);
        agent.age = 10_000.0;
        agent.stats.health = f32::NAN;
        let field = ResourceField::new(10.0);
        let houses = HouseRegistry::new();
        let clock = DayClock::default();
        let config = LifecycleConfig::default();

        let obs = assemble(&agent, &context(&field, &houses, &clock, &config));
        assert!(obs.features.iter().all(|f| (-1.0..=1.0).contains(f)));
        assert_eq!(obs.features[AGE], 1.0);
    }

    #[test]
    fn test_remembered_game_is_followed_after_it_moves() {
        let mut agent = agent_at(1, 0.0, 0.0);
        let mut field = ResourceField::new(10.0);
        field.add_food(2.0, 0.0, 3);
        let deer = field.add_game(4.0, 0.0, Species::Deer, 11);
        agent.target = Some(TargetRef {
            kind: TargetKind::Food,
            id: deer,
        });
        let houses = HouseRegistry::new();
        let clock = DayClock::default();
        let config = LifecycleConfig::default();

        field.advance(1.0, &[]);
        let (x, z) = (field.food[deer as usize].x, field.food[deer as usize].z);
        assert!((x - 4.0).hypot(z) > 1.0);

        let obs = assemble(&agent, &context(&field, &houses, &clock, &config));
        let food = obs.food.expect("deer still in sight");
        assert_eq!(food.target.id, deer);
        assert_eq!((food.x, food.z), (x, z));

        agent.target = None;
        let fresh = assemble(&agent, &context(&field, &houses, &clock, &config));
        assert_ne!(fresh.food.map(|f| f.target.id), Some(deer));
    }
}

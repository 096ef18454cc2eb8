//! Boundaries with the collaborators the core does not own.
//!
//! Terrain, the food/threat index and the house registry live outside the
//! agent core. The core only queries them through these traits, so tests and
//! embedding applications can supply their own.

use settlers_data::{AgentId, HouseId, Occupancy, Position, TargetKind, TargetRef};

/// Height-field lookup. Assumed defined everywhere agents can walk.
pub trait Terrain: Send + Sync {
    fn height(&self, x: f64, z: f64) -> f64;
}

impl<F> Terrain for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn height(&self, x: f64, z: f64) -> f64 {
        self(x, z)
    }
}

/// A resolved target: which object and where it currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub target: TargetRef,
    pub x: f64,
    pub z: f64,
}

impl Target {
    #[must_use]
    pub fn distance_from(&self, x: f64, z: f64) -> f64 {
        ((self.x - x).powi(2) + (self.z - z).powi(2)).sqrt()
    }
}

/// Nearest-entity queries for food sources and threats.
pub trait SpatialIndex: Send + Sync {
    /// Closest live object of `kind` within `radius` of `(x, z)`.
    fn nearest(&self, kind: TargetKind, x: f64, z: f64, radius: f64) -> Option<Target>;

    /// Current location of a previously seen object, or `None` once it is gone.
    fn resolve(&self, target: TargetRef) -> Option<Target>;
}

/// Mutable side of the food and threat collaborator, only touched during the commit phase.
pub trait FoodSupply: Send + Sync {
    /// Takes one serving; `false` when the source is gone or empty.
    fn harvest(&mut self, food: u32) -> bool;

    /// Advances regrowth by `dt` seconds.
    fn regrow(&mut self, _dt: f64) {}

    /// Moves whatever roams by `dt` seconds. `settlers` are live agent
    /// positions that game runs from.
    fn advance(&mut self, _dt: f64, _settlers: &[(f64, f64)]) {}
}

/// Food and threat collaborator as owned by the world.
pub trait ResourceProvider: SpatialIndex + FoodSupply {}

impl<T: SpatialIndex + FoodSupply> ResourceProvider for T {}

/// House occupancy queries and claims.
///
/// Claims and releases take `&mut self`; the world only calls them from its
/// single-threaded commit phase.
pub trait ShelterRegistry: Send + Sync {
    /// Closest house within `radius` that has a free slot or already hosts `agent`.
    fn nearest_shelter(&self, agent: AgentId, x: f64, z: f64, radius: f64) -> Option<Target>;

    /// Every house id, ascending.
    fn house_ids(&self) -> Vec<HouseId>;

    fn position(&self, house: HouseId) -> Option<Position>;

    fn occupants(&self, house: HouseId) -> &[AgentId];

    fn capacity(&self, house: HouseId) -> usize;

    /// Atomically takes a slot. Idempotent for an agent already inside.
    fn claim_slot(&mut self, house: HouseId, agent: AgentId) -> bool;

    fn release_slot(&mut self, house: HouseId, agent: AgentId);
}

/// Occupancy of `house` with each occupant's current stage looked up via `stage_of`.
pub fn house_occupancy<S, F>(shelters: &S, house: HouseId, stage_of: F) -> Occupancy
where
    S: ShelterRegistry + ?Sized,
    F: Fn(AgentId) -> Option<settlers_data::LifeStage>,
{
    let occupants = shelters.occupants(house);
    Occupancy {
        count: occupants.len(),
        stages: occupants.iter().filter_map(|id| stage_of(*id)).collect(),
    }
}

//! Reference collaborators: flat terrain, a scanned resource field and a
//! house arena. Embedders with real terrain or spatial partitioning replace
//! these through the `interfaces` traits.

use crate::interfaces::{FoodSupply, ShelterRegistry, SpatialIndex, Target, Terrain};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use settlers_data::{AgentId, House, HouseId, Position, TargetKind, TargetRef};
use std::f64::consts::{PI, TAU};

/// Level ground at a fixed height.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatTerrain {
    pub elevation: f64,
}

impl Terrain for FlatTerrain {
    fn height(&self, _x: f64, _z: f64) -> f64 {
        self.elevation
    }
}

/// Distance at which game notices a settler.
const FLEE_RANGE: f64 = 8.0;
/// Seconds a startled animal keeps running once out of sight.
const FLEE_SECONDS: f64 = 3.0;
const FLEE_SPEEDUP: f64 = 1.5;
/// Speed of roaming threats, world units per second.
const THREAT_SPEED: f64 = 1.2;

/// Heading and pace of something that wanders on its own.
///
/// Each change of heading draws from a stream keyed by `seed` and `turns`,
/// so movement replays exactly for a given field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stride {
    pub heading: f64,
    pub speed: f64,
    /// Seconds until the next change of heading.
    pub turn_timer: f64,
    pub seed: u64,
    pub turns: u64,
}

impl Stride {
    #[must_use]
    pub fn new(speed: f64, seed: u64) -> Self {
        Self {
            heading: 0.0,
            speed,
            turn_timer: 0.0,
            seed,
            turns: 0,
        }
    }

    #[must_use]
    pub fn still() -> Self {
        Self::new(0.0, 0)
    }

    fn next_rng(&mut self) -> ChaCha8Rng {
        let rng = ChaCha8Rng::seed_from_u64(self.seed ^ self.turns.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.turns += 1;
        rng
    }

    fn wander(&mut self, dt: f64) {
        self.turn_timer -= dt;
        if self.turn_timer <= 0.0 {
            let mut rng = self.next_rng();
            self.heading = rng.gen_range(0.0..TAU);
            self.turn_timer = rng.gen_range(2.0..6.0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    Deer,
    Rabbit,
    Boar,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Deer, Species::Rabbit, Species::Boar];

    #[must_use]
    pub fn speed(self) -> f64 {
        match self {
            Species::Deer => 1.5,
            Species::Rabbit => 2.0,
            Species::Boar => 1.0,
        }
    }

    /// Servings one carcass feeds.
    #[must_use]
    pub fn meat_value(self) -> u32 {
        match self {
            Species::Deer => 4,
            Species::Rabbit => 2,
            Species::Boar => 5,
        }
    }
}

/// A live animal. Game is food that moves, flees settlers and dies of age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub species: Species,
    pub stride: Stride,
    pub age: f64,
    pub max_age: f64,
    pub flee_timer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSource {
    pub id: u32,
    pub x: f64,
    pub z: f64,
    pub servings: u32,
    pub max_servings: u32,
    /// Seconds until the next serving grows back.
    pub regrow_timer: f64,
    /// `None` for bushes.
    #[serde(default)]
    pub game: Option<Game>,
}

impl FoodSource {
    /// Game that has not been hunted yet. Carcasses stay where they fell.
    fn roams(&self) -> bool {
        self.game.is_some() && self.servings > 0 && self.servings == self.max_servings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub id: u32,
    pub x: f64,
    pub z: f64,
    #[serde(default = "Stride::still")]
    pub stride: Stride,
}

/// Food sources and threats, queried by linear scan.
///
/// Ids index the vectors and are never reused: dead game stays behind as an
/// empty entry and a newborn takes the next id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceField {
    pub food: Vec<FoodSource>,
    pub threats: Vec<Threat>,
    /// Seconds per regrown serving.
    pub regrow_seconds: f64,
    /// Half extents movers stay within; unbounded when `None`.
    #[serde(default)]
    pub bounds: Option<(f64, f64)>,
}

impl ResourceField {
    #[must_use]
    pub fn new(regrow_seconds: f64) -> Self {
        Self {
            food: Vec::new(),
            threats: Vec::new(),
            regrow_seconds,
            bounds: None,
        }
    }

    pub fn add_food(&mut self, x: f64, z: f64, servings: u32) -> u32 {
        self.push_food(x, z, servings, None)
    }

    /// Adds a wandering animal whose lifespan and headings derive from `seed`.
    pub fn add_game(&mut self, x: f64, z: f64, species: Species, seed: u64) -> u32 {
        let mut stride = Stride::new(species.speed(), seed);
        let max_age = stride.next_rng().gen_range(300.0..600.0);
        let game = Game {
            species,
            stride,
            age: 0.0,
            max_age,
            flee_timer: 0.0,
        };
        self.push_food(x, z, species.meat_value(), Some(game))
    }

    fn push_food(&mut self, x: f64, z: f64, servings: u32, game: Option<Game>) -> u32 {
        let id = self.food.len() as u32;
        self.food.push(FoodSource {
            id,
            x,
            z,
            servings,
            max_servings: servings,
            regrow_timer: self.regrow_seconds,
            game,
        });
        id
    }

    pub fn add_threat(&mut self, x: f64, z: f64) -> u32 {
        self.push_threat(x, z, Stride::still())
    }

    pub fn add_roaming_threat(&mut self, x: f64, z: f64, speed: f64, seed: u64) -> u32 {
        self.push_threat(x, z, Stride::new(speed, seed))
    }

    fn push_threat(&mut self, x: f64, z: f64, stride: Stride) -> u32 {
        let id = self.threats.len() as u32;
        self.threats.push(Threat { id, x, z, stride });
        id
    }

    /// Uniformly scatters bushes, game and roaming threats over a
    /// `width x depth` area centred on the origin.
    pub fn scatter_with_rng<R: Rng>(
        width: f64,
        depth: f64,
        food: usize,
        game: usize,
        threats: usize,
        rng: &mut R,
    ) -> Self {
        let mut field = Self::new(20.0);
        let (hw, hd) = (width / 2.0, depth / 2.0);
        field.bounds = Some((hw, hd));
        for _ in 0..food {
            let servings = rng.gen_range(3..=8);
            field.add_food(rng.gen_range(-hw..hw), rng.gen_range(-hd..hd), servings);
        }
        for _ in 0..game {
            let species = Species::ALL[rng.gen_range(0..Species::ALL.len())];
            field.add_game(rng.gen_range(-hw..hw), rng.gen_range(-hd..hd), species, rng.gen());
        }
        for _ in 0..threats {
            field.add_roaming_threat(
                rng.gen_range(-hw..hw),
                rng.gen_range(-hd..hd),
                THREAT_SPEED,
                rng.gen(),
            );
        }
        field
    }

    fn step_game(&mut self, idx: usize, dt: f64, settlers: &[(f64, f64)]) {
        let bounds = self.bounds;
        let roams = self.food[idx].roams();
        let source = &mut self.food[idx];
        let Some(game) = source.game.as_mut() else {
            return;
        };
        game.age += dt;
        if game.age >= game.max_age || source.servings == 0 {
            source.servings = 0;
            source.max_servings = 0;
            let species = game.species;
            let mut rng = game.stride.next_rng();
            source.game = None;
            tracing::debug!(id = source.id, ?species, "Game died");
            let (x, z) = match bounds {
                Some((hw, hd)) => (rng.gen_range(-hw..hw), rng.gen_range(-hd..hd)),
                None => (source.x, source.z),
            };
            self.add_game(x, z, species, rng.gen());
            return;
        }
        if !roams {
            return;
        }

        let startled = settlers
            .iter()
            .map(|&(sx, sz)| (sx, sz, (source.x - sx).hypot(source.z - sz)))
            .filter(|&(_, _, d)| d < FLEE_RANGE)
            .min_by(|a, b| a.2.total_cmp(&b.2));
        let speed = match startled {
            Some((sx, sz, _)) => {
                game.stride.heading = (source.z - sz).atan2(source.x - sx);
                game.flee_timer = FLEE_SECONDS;
                game.stride.speed * FLEE_SPEEDUP
            }
            None if game.flee_timer > 0.0 => {
                game.flee_timer -= dt;
                game.stride.speed * FLEE_SPEEDUP
            }
            None => {
                game.stride.wander(dt);
                game.stride.speed
            }
        };
        (source.x, source.z) = stride_step(&mut game.stride, source.x, source.z, speed * dt, bounds);
    }
}

/// Moves along `stride.heading`, bouncing off `bounds`.
fn stride_step(stride: &mut Stride, x: f64, z: f64, distance: f64, bounds: Option<(f64, f64)>) -> (f64, f64) {
    let mut nx = x + stride.heading.cos() * distance;
    let mut nz = z + stride.heading.sin() * distance;
    if let Some((hw, hd)) = bounds {
        if nx.abs() > hw {
            nx = nx.clamp(-hw, hw);
            stride.heading = PI - stride.heading;
        }
        if nz.abs() > hd {
            nz = nz.clamp(-hd, hd);
            stride.heading = -stride.heading;
        }
    }
    (nx, nz)
}

impl SpatialIndex for ResourceField {
    fn nearest(&self, kind: TargetKind, x: f64, z: f64, radius: f64) -> Option<Target> {
        let candidates: Box<dyn Iterator<Item = (u32, f64, f64)> + '_> = match kind {
            TargetKind::Food => Box::new(
                self.food
                    .iter()
                    .filter(|f| f.servings > 0)
                    .map(|f| (f.id, f.x, f.z)),
            ),
            TargetKind::Threat => Box::new(self.threats.iter().map(|t| (t.id, t.x, t.z))),
            TargetKind::Shelter => return None,
        };

        let mut best: Option<(f64, Target)> = None;
        for (id, tx, tz) in candidates {
            let dist = ((tx - x).powi(2) + (tz - z).powi(2)).sqrt();
            if dist > radius {
                continue;
            }
            if best.as_ref().map_or(true, |(d, _)| dist < *d) {
                best = Some((
                    dist,
                    Target {
                        target: TargetRef { kind, id },
                        x: tx,
                        z: tz,
                    },
                ));
            }
        }
        best.map(|(_, t)| t)
    }

    fn resolve(&self, target: TargetRef) -> Option<Target> {
        let (x, z) = match target.kind {
            TargetKind::Food => self
                .food
                .get(target.id as usize)
                .filter(|f| f.servings > 0)
                .map(|f| (f.x, f.z))?,
            TargetKind::Threat => self
                .threats
                .get(target.id as usize)
                .map(|t| (t.x, t.z))?,
            TargetKind::Shelter => return None,
        };
        Some(Target { target, x, z })
    }
}

impl FoodSupply for ResourceField {
    fn harvest(&mut self, food: u32) -> bool {
        match self.food.get_mut(food as usize) {
            Some(source) if source.servings > 0 => {
                source.servings -= 1;
                true
            }
            _ => false,
        }
    }

    fn regrow(&mut self, dt: f64) {
        if self.regrow_seconds <= 0.0 {
            return;
        }
        for source in &mut self.food {
            if source.game.is_some() || source.servings >= source.max_servings {
                source.regrow_timer = self.regrow_seconds;
                continue;
            }
            source.regrow_timer -= dt;
            if source.regrow_timer <= 0.0 {
                source.servings += 1;
                source.regrow_timer += self.regrow_seconds;
            }
        }
    }

    fn advance(&mut self, dt: f64, settlers: &[(f64, f64)]) {
        // Newborn game lands past `len` and starts moving next tick.
        for idx in 0..self.food.len() {
            if self.food[idx].game.is_some() {
                self.step_game(idx, dt, settlers);
            }
        }
        let bounds = self.bounds;
        for threat in &mut self.threats {
            if threat.stride.speed <= 0.0 {
                continue;
            }
            threat.stride.wander(dt);
            let distance = threat.stride.speed * dt;
            (threat.x, threat.z) = stride_step(&mut threat.stride, threat.x, threat.z, distance, bounds);
        }
    }
}

/// Arena of houses indexed by `HouseId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HouseRegistry {
    houses: Vec<House>,
}

impl HouseRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_house(&mut self, position: Position, capacity: usize) -> HouseId {
        let id = HouseId(self.houses.len() as u32);
        self.houses.push(House::new(id, position, capacity));
        id
    }

    /// Places `count` houses at random with heights taken from `terrain`.
    pub fn scatter_with_rng<R: Rng, T: Terrain + ?Sized>(
        count: usize,
        capacity: usize,
        width: f64,
        depth: f64,
        terrain: &T,
        rng: &mut R,
    ) -> Self {
        let mut registry = Self::new();
        let (hw, hd) = (width / 2.0, depth / 2.0);
        for _ in 0..count {
            let x = rng.gen_range(-hw..hw);
            let z = rng.gen_range(-hd..hd);
            registry.add_house(Position::new(x, terrain.height(x, z), z), capacity);
        }
        registry
    }

    #[must_use]
    pub fn get(&self, id: HouseId) -> Option<&House> {
        self.houses.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &House> {
        self.houses.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.houses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }
}

impl ShelterRegistry for HouseRegistry {
    fn nearest_shelter(&self, agent: AgentId, x: f64, z: f64, radius: f64) -> Option<Target> {
        self.houses
            .iter()
            .filter(|h| h.has_space() || h.hosts(agent))
            .map(|h| (h.position.planar_distance(x, z), h))
            .filter(|(d, _)| *d <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, h)| Target {
                target: TargetRef {
                    kind: TargetKind::Shelter,
                    id: h.id.0,
                },
                x: h.position.x,
                z: h.position.z,
            })
    }

    fn house_ids(&self) -> Vec<HouseId> {
        self.houses.iter().map(|h| h.id).collect()
    }

    fn position(&self, house: HouseId) -> Option<Position> {
        self.get(house).map(|h| h.position)
    }

    fn occupants(&self, house: HouseId) -> &[AgentId] {
        self.get(house).map_or(&[], |h| h.occupants.as_slice())
    }

    fn capacity(&self, house: HouseId) -> usize {
        self.get(house).map_or(0, |h| h.capacity)
    }

    fn claim_slot(&mut self, house: HouseId, agent: AgentId) -> bool {
        let Some(h) = self.houses.get_mut(house.0 as usize) else {
            return false;
        };
        if h.hosts(agent) {
            return true;
        }
        if h.is_full() {
            return false;
        }
        h.occupants.push(agent);
        true
    }

    fn release_slot(&mut self, house: HouseId, agent: AgentId) {
        if let Some(h) = self.houses.get_mut(house.0 as usize) {
            h.occupants.retain(|a| *a != agent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_food_skips_empty_and_out_of_range() {
        let mut field = ResourceField::new(10.0);
        let near = field.add_food(1.0, 0.0, 0);
        let far = field.add_food(5.0, 0.0, 2);
        field.add_food(50.0, 0.0, 2);
        assert_ne!(near, far);

        let hit = field
            .nearest(TargetKind::Food, 0.0, 0.0, 10.0)
            .expect("one source in range");
        assert_eq!(hit.target.id, far);
        assert!(field.nearest(TargetKind::Food, 0.0, 0.0, 2.0).is_none());
        assert!(field.nearest(TargetKind::Shelter, 0.0, 0.0, 100.0).is_none());
    }

    #[test]
    fn test_harvest_and_regrow() {
        let mut field = ResourceField::new(5.0);
        let id = field.add_food(0.0, 0.0, 1);
        assert!(field.harvest(id));
        assert!(!field.harvest(id));
        let target = TargetRef {
            kind: TargetKind::Food,
            id,
        };
        assert!(field.resolve(target).is_none());
        field.regrow(5.0);
        assert_eq!(field.food[0].servings, 1);
        assert!(field.resolve(target).is_some());
        assert!(!field.harvest(99));
    }

    #[test]
    fn test_claim_slot_respects_capacity() {
        let mut houses = HouseRegistry::new();
        let id = houses.add_house(Position::default(), 2);
        assert!(houses.claim_slot(id, AgentId(1)));
        assert!(houses.claim_slot(id, AgentId(1)));
        assert!(houses.claim_slot(id, AgentId(2)));
        assert!(!houses.claim_slot(id, AgentId(3)));
        assert_eq!(houses.occupants(id), &[AgentId(1), AgentId(2)]);

        houses.release_slot(id, AgentId(1));
        assert!(houses.claim_slot(id, AgentId(3)));
        assert!(!houses.claim_slot(HouseId(9), AgentId(4)));
    }

    #[test]
    fn test_nearest_shelter_includes_own_full_house() {
        let mut houses = HouseRegistry::new();
        let full = houses.add_house(Position::new(1.0, 0.0, 0.0), 2);
        let open = houses.add_house(Position::new(5.0, 0.0, 0.0), 2);
        houses.claim_slot(full, AgentId(1));
        houses.claim_slot(full, AgentId(2));

        let for_resident = houses
            .nearest_shelter(AgentId(1), 0.0, 0.0, 20.0)
            .expect("own house");
        assert_eq!(for_resident.target.id, full.0);
        let for_stranger = houses
            .nearest_shelter(AgentId(7), 0.0, 0.0, 20.0)
            .expect("open house");
        assert_eq!(for_stranger.target.id, open.0);
    }

    #[test]
    fn test_closure_terrain() {
        let slope = |x: f64, _z: f64| x * 0.5;
        assert_eq!(slope.height(4.0, 1.0), 2.0);
        assert_eq!(FlatTerrain { elevation: 3.0 }.height(1.0, 1.0), 3.0);
    }

    #[test]
    fn test_game_flees_nearby_settler() {
        let mut field = ResourceField::new(10.0);
        let rabbit = field.add_game(2.0, 0.0, Species::Rabbit, 3);
        field.advance(1.0, &[(0.0, 0.0), (40.0, 0.0)]);

        let source = &field.food[rabbit as usize];
        assert!((source.x - (2.0 + 2.0 * FLEE_SPEEDUP)).abs() < 1e-9);
        assert!(source.z.abs() < 1e-9);
        assert_eq!(source.game.as_ref().map(|g| g.flee_timer), Some(FLEE_SECONDS));
    }

    #[test]
    fn test_hunted_game_stays_put_and_never_regrows() {
        let mut field = ResourceField::new(1.0);
        let boar = field.add_game(0.0, 0.0, Species::Boar, 5);
        assert!(field.harvest(boar));
        field.advance(2.0, &[(1.0, 0.0)]);
        field.regrow(5.0);

        let source = &field.food[boar as usize];
        assert_eq!((source.x, source.z), (0.0, 0.0));
        assert_eq!(source.servings, Species::Boar.meat_value() - 1);
    }

    #[test]
    fn test_dead_game_is_replaced_under_a_new_id() {
        let mut field = ResourceField::new(10.0);
        let deer = field.add_game(0.0, 0.0, Species::Deer, 9);
        let target = TargetRef {
            kind: TargetKind::Food,
            id: deer,
        };
        if let Some(game) = field.food[0].game.as_mut() {
            game.age = game.max_age;
        }
        field.advance(0.1, &[]);

        assert!(field.resolve(target).is_none());
        assert_eq!(field.food.len(), 2);
        let newborn = field.nearest(TargetKind::Food, 0.0, 0.0, 1.0).expect("replacement");
        assert_eq!(newborn.target.id, 1);
        assert_eq!(field.food[1].game.as_ref().map(|g| g.species), Some(Species::Deer));
    }

    #[test]
    fn test_threats_roam_inside_bounds_and_replay() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut a = ResourceField::scatter_with_rng(20.0, 20.0, 0, 0, 3, &mut rng);
        let mut b = a.clone();
        let start: Vec<(f64, f64)> = a.threats.iter().map(|t| (t.x, t.z)).collect();
        for _ in 0..500 {
            a.advance(0.5, &[]);
            b.advance(0.5, &[]);
        }
        assert!(a.threats.iter().all(|t| t.x.abs() <= 10.0 && t.z.abs() <= 10.0));
        assert_ne!(a.threats.iter().map(|t| (t.x, t.z)).collect::<Vec<_>>(), start);
        assert_eq!(a.threats, b.threats);

        let moved = a.resolve(TargetRef {
            kind: TargetKind::Threat,
            id: 0,
        });
        assert_eq!(moved.map(|t| (t.x, t.z)), Some((a.threats[0].x, a.threats[0].z)));
    }
}

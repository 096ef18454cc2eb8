//! Configuration management for simulation parameters.
//!
//! All tunables map to sections of `config.toml`. Missing sections and fields
//! fall back to the `Default` impls below.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! initial_population = 24
//! seed = 42
//! deterministic = true
//!
//! [lifecycle]
//! adult_age = 60.0
//! reproduction_chance = 0.05
//!
//! [evolution]
//! mutation_rate = 0.1
//! selection = { kind = "tournament", size = 3 }
//! ```

use serde::{Deserialize, Serialize};

/// World-level parameters: population size, clock and reference collaborators.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub initial_population: usize,
    /// Below this many live agents the world reseeds from the fitness archive.
    pub min_population: usize,
    pub seed: Option<u64>,
    pub deterministic: bool,
    /// Simulated seconds per tick.
    pub tick_seconds: f64,
    /// Simulated seconds per full day.
    pub day_length: f64,
    pub width: f64,
    pub depth: f64,
    pub initial_food: usize,
    /// Wandering animals; each carcass feeds several servings.
    pub initial_game: usize,
    pub initial_threats: usize,
    pub house_count: usize,
    /// Founders begin just past `adult_age` instead of as newborns.
    pub founders_start_adult: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_population: 20,
            min_population: 4,
            seed: None,
            deterministic: false,
            tick_seconds: 0.1,
            day_length: 120.0,
            width: 128.0,
            depth: 128.0,
            initial_food: 60,
            initial_game: 12,
            initial_threats: 4,
            house_count: 10,
            founders_start_adult: true,
        }
    }
}

/// Survival, aging and reproduction rates. Rates are per simulated second.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    pub adult_age: f64,
    pub elder_age: f64,
    pub max_lifespan: f64,
    /// Walking speed in units per second before the speed trait applies.
    pub walk_speed: f64,
    /// Death probability per second for an elder at `max_lifespan`, scaled linearly from `elder_age`.
    pub elder_mortality: f64,
    pub hunger_rate: f32,
    pub eat_amount: f32,
    pub eat_radius: f64,
    pub move_stamina_cost: f32,
    pub rest_stamina_regen: f32,
    pub shelter_stamina_regen: f32,
    pub starvation_damage: f32,
    pub exhaustion_damage: f32,
    pub exposure_damage: f32,
    pub daytime_wear: f32,
    pub threat_damage: f32,
    pub threat_contact_radius: f64,
    pub health_regen: f32,
    /// Hunger at or below which a sheltered agent heals.
    pub well_fed_threshold: f32,
    /// Hunger at or above which starvation damage applies.
    pub critical_hunger: f32,
    /// Stamina at or below which exhaustion damage applies.
    pub critical_stamina: f32,
    /// Distance at which an agent can enter a house.
    pub shelter_radius: f64,
    pub shelter_sense_range: f64,
    pub reproduction_cooldown: f64,
    /// Chance per second that an eligible house produces a child.
    pub reproduction_chance: f64,
    /// Births need a full house of two adults, so larger houses only shelter.
    pub house_capacity: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            adult_age: 60.0,
            elder_age: 300.0,
            max_lifespan: 420.0,
            walk_speed: 1.5,
            elder_mortality: 0.01,
            hunger_rate: 0.5,
            eat_amount: 20.0,
            eat_radius: 1.5,
            move_stamina_cost: 0.5,
            rest_stamina_regen: 10.0,
            shelter_stamina_regen: 15.0,
            starvation_damage: 5.0,
            exhaustion_damage: 2.0,
            exposure_damage: 3.0,
            daytime_wear: 0.0,
            threat_damage: 10.0,
            threat_contact_radius: 1.5,
            health_regen: 1.0,
            well_fed_threshold: 50.0,
            critical_hunger: 100.0,
            critical_stamina: 0.0,
            shelter_radius: 2.0,
            shelter_sense_range: 60.0,
            reproduction_cooldown: 30.0,
            reproduction_chance: 0.05,
            house_capacity: 2,
        }
    }
}

/// How parents are drawn when filling non-elite reseed slots.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Roulette wheel over non-negative fitness.
    #[default]
    FitnessProportionate,
    /// Best of `size` uniformly drawn candidates.
    Tournament { size: usize },
}

/// Weights of the fitness sum.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct FitnessWeights {
    pub survival: f64,
    pub resources: f64,
    pub reproduction: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            survival: 0.1,
            resources: 10.0,
            reproduction: 50.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvolutionConfig {
    pub mutation_rate: f32,
    pub mutation_strength: f32,
    /// Trait noise relative to the trait's range, on top of `mutation_strength`.
    pub trait_mutation_scale: f32,
    pub elite_fraction: f32,
    pub selection: SelectionPolicy,
    /// Recorded genomes kept for reseeding after deaths.
    pub archive_capacity: usize,
    pub fitness_weights: FitnessWeights,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.1,
            mutation_strength: 0.2,
            trait_mutation_scale: 0.1,
            elite_fraction: 0.1,
            selection: SelectionPolicy::default(),
            archive_capacity: 64,
            fitness_weights: FitnessWeights::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AdvisorConfig {
    pub enabled: bool,
    pub timeout_ms: u64,
    /// Suggestions older than this many ticks are ignored.
    pub max_staleness_ticks: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 250,
            max_staleness_ticks: 10,
        }
    }
}

/// Root configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub lifecycle: LifecycleConfig,
    pub evolution: EvolutionConfig,
    pub advisor: AdvisorConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns the first violated rule as an error.
    pub fn validate(&self) -> anyhow::Result<()> {
        let w = &self.world;
        anyhow::ensure!(w.initial_population > 0, "Initial population must be positive");
        anyhow::ensure!(
            w.min_population <= w.initial_population,
            "Minimum population cannot exceed initial population"
        );
        anyhow::ensure!(
            w.tick_seconds > 0.0 && w.tick_seconds.is_finite(),
            "Tick length must be positive"
        );
        anyhow::ensure!(w.day_length > 0.0, "Day length must be positive");
        anyhow::ensure!(
            w.width > 0.0 && w.depth > 0.0,
            "World dimensions must be positive"
        );

        let l = &self.lifecycle;
        anyhow::ensure!(l.adult_age > 0.0, "Adult age must be positive");
        anyhow::ensure!(
            l.adult_age < l.elder_age,
            "Adult age must be below elder age"
        );
        anyhow::ensure!(
            l.elder_age < l.max_lifespan,
            "Elder age must be below max lifespan"
        );
        anyhow::ensure!(l.walk_speed > 0.0, "Walk speed must be positive");
        anyhow::ensure!(
            (0.0..=1.0).contains(&l.elder_mortality),
            "Elder mortality must be in [0, 1]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&l.reproduction_chance),
            "Reproduction chance must be in [0, 1]"
        );
        anyhow::ensure!(
            l.house_capacity >= 2,
            "House capacity must allow two occupants"
        );
        for (name, value) in [
            ("hunger_rate", l.hunger_rate),
            ("eat_amount", l.eat_amount),
            ("move_stamina_cost", l.move_stamina_cost),
            ("rest_stamina_regen", l.rest_stamina_regen),
            ("shelter_stamina_regen", l.shelter_stamina_regen),
            ("starvation_damage", l.starvation_damage),
            ("exhaustion_damage", l.exhaustion_damage),
            ("exposure_damage", l.exposure_damage),
            ("daytime_wear", l.daytime_wear),
            ("threat_damage", l.threat_damage),
            ("health_regen", l.health_regen),
        ] {
            anyhow::ensure!(value >= 0.0, "{} must be non-negative", name);
        }
        for (name, value) in [
            ("well_fed_threshold", l.well_fed_threshold),
            ("critical_hunger", l.critical_hunger),
            ("critical_stamina", l.critical_stamina),
        ] {
            anyhow::ensure!((0.0..=100.0).contains(&value), "{} must be in [0, 100]", name);
        }
        anyhow::ensure!(
            l.shelter_sense_range > 0.0 && l.shelter_radius >= 0.0,
            "Shelter ranges must be positive"
        );
        anyhow::ensure!(
            l.reproduction_cooldown >= 0.0,
            "Reproduction cooldown must be non-negative"
        );

        let e = &self.evolution;
        anyhow::ensure!(
            (0.0..=1.0).contains(&e.mutation_rate),
            "Mutation rate must be in [0, 1]"
        );
        anyhow::ensure!(
            e.mutation_strength >= 0.0,
            "Mutation strength must be non-negative"
        );
        anyhow::ensure!(
            e.trait_mutation_scale >= 0.0,
            "Trait mutation scale must be non-negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&e.elite_fraction),
            "Elite fraction must be in [0, 1]"
        );
        if let SelectionPolicy::Tournament { size } = e.selection {
            anyhow::ensure!(size > 0, "Tournament size must be positive");
        }
        anyhow::ensure!(e.archive_capacity > 0, "Archive capacity must be positive");
        let fw = &e.fitness_weights;
        anyhow::ensure!(
            fw.survival >= 0.0 && fw.resources >= 0.0 && fw.reproduction >= 0.0,
            "Fitness weights must be non-negative"
        );

        anyhow::ensure!(
            !self.advisor.enabled || self.advisor.timeout_ms > 0,
            "Advisor timeout must be positive"
        );
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Hash of the sections that change simulation outcomes.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.lifecycle).as_bytes());
        hasher.update(format!("{:?}", self.evolution).as_bytes());
        hasher.update(format!("{:?}", self.world.tick_seconds).as_bytes());
        hasher.update(format!("{:?}", self.world.day_length).as_bytes());
        hex::encode(hasher.finalize())
    }
}

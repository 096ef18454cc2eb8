//! Agent lifecycle: creation, aging, survival stats and death.

use crate::config::{FitnessWeights, LifecycleConfig};
use rand::Rng;
use settlers_data::{
    Action, Agent, AgentId, DeathCause, FitnessComponents, Genome, LifeStage, MilestoneKind,
    Position, SurvivalStats, STAT_MAX,
};

const FIRST_PARTS: [&str; 30] = [
    "Al", "Ar", "Br", "Ca", "Da", "El", "Fr", "Ga", "Ha", "Ja", "Ke", "La", "Ma", "Na", "Ol",
    "Pa", "Ra", "Sa", "Ta", "Va", "Wi", "Za", "Ch", "Th", "Sh", "Ph", "Tr", "Gr", "Bl", "Kl",
];
const FIRST_SUFFIXES: [&str; 30] = [
    "ex", "an", "en", "on", "in", "al", "ar", "er", "or", "yn", "is", "us", "os", "as", "ed",
    "id", "od", "ad", "el", "ol", "am", "em", "im", "om", "um", "ak", "ek", "ik", "ok", "uk",
];
const LAST_PARTS: [&str; 28] = [
    "Gre", "Bro", "Wat", "Smi", "Joh", "Wil", "Dav", "Mil", "And", "Rob", "Lew", "Wri", "Lee",
    "Har", "Mar", "Gon", "Mor", "Cla", "Gra", "Sha", "Whi", "Haw", "Kni", "Tho", "Sco", "Blu",
    "For", "Cra",
];
const LAST_SUFFIXES: [&str; 19] = [
    "son", "ton", "den", "man", "lin", "win", "ford", "wood", "hill", "well", "field", "stone",
    "brook", "vale", "ridge", "lake", "river", "peak", "shore",
];

/// Two-part name derived from the agent id. Same id, same name.
#[must_use]
pub fn name_for(id: AgentId) -> String {
    // splitmix64 finalizer spreads consecutive ids across the tables
    let mut h = id.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;

    let pick = |shift: u32, len: usize| ((h >> shift) as usize) % len;
    format!(
        "{}{} {}{}",
        FIRST_PARTS[pick(0, FIRST_PARTS.len())],
        FIRST_SUFFIXES[pick(16, FIRST_SUFFIXES.len())],
        LAST_PARTS[pick(32, LAST_PARTS.len())],
        LAST_SUFFIXES[pick(48, LAST_SUFFIXES.len())],
    )
}

/// Builds a newborn (or founder) agent. The caller supplies `position.y` from terrain.
#[must_use]
pub fn create_agent(
    id: AgentId,
    genome: Genome,
    generation: u32,
    parents: Vec<AgentId>,
    position: Position,
    birth_tick: u64,
) -> Agent {
    Agent {
        id,
        name: name_for(id),
        generation,
        parents,
        genome,
        stats: SurvivalStats::default(),
        age: 0.0,
        stage: LifeStage::Child,
        position,
        heading: 0.0,
        house: None,
        target: None,
        last_action: Action::Wander,
        reproduction_cooldown: 0.0,
        fitness: FitnessComponents::default(),
        cause_of_death: None,
        birth_tick,
    }
}

/// Stage implied by age alone. Never returns `Dead`.
#[must_use]
pub fn stage_for_age(age: f64, config: &LifecycleConfig) -> LifeStage {
    if age >= config.elder_age {
        LifeStage::Elder
    } else if age >= config.adult_age {
        LifeStage::Adult
    } else {
        LifeStage::Child
    }
}

/// Own-side reproduction eligibility: alive adult with its cooldown elapsed.
#[must_use]
pub fn can_reproduce(agent: &Agent) -> bool {
    agent.stage == LifeStage::Adult && agent.reproduction_cooldown <= 0.0
}

/// Weighted fitness sum. Non-negative and non-decreasing in every component.
#[must_use]
pub fn fitness(components: &FitnessComponents, weights: &FitnessWeights) -> f64 {
    weights.survival.max(0.0) * components.survival_seconds.max(0.0)
        + weights.resources.max(0.0) * f64::from(components.resources_gathered)
        + weights.reproduction.max(0.0) * f64::from(components.reproductions)
}

/// What the agent did this tick, as far as its body is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Exertion {
    /// Distance walked.
    pub moved: f64,
    pub resting: bool,
}

/// Conditions around the agent this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Surroundings {
    pub night: bool,
    /// Distance to the nearest threat, if one is in sight.
    pub threat_distance: Option<f64>,
}

/// Health lost this tick, per source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageReport {
    pub starvation: f32,
    pub exhaustion: f32,
    pub exposure: f32,
    pub predation: f32,
}

impl DamageReport {
    #[must_use]
    pub fn total(&self) -> f32 {
        self.starvation + self.exhaustion + self.exposure + self.predation
    }

    /// Largest source; ties prefer the earlier listed cause.
    #[must_use]
    pub fn dominant_cause(&self) -> Option<DeathCause> {
        let sources = [
            (DeathCause::Starvation, self.starvation),
            (DeathCause::Exhaustion, self.exhaustion),
            (DeathCause::Exposure, self.exposure),
            (DeathCause::Predation, self.predation),
        ];
        let mut best: Option<(DeathCause, f32)> = None;
        for (cause, amount) in sources {
            if amount > 0.0 && best.map_or(true, |(_, b)| amount > b) {
                best = Some((cause, amount));
            }
        }
        best.map(|(cause, _)| cause)
    }
}

/// Result of one lifecycle step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LifecycleUpdate {
    pub died: Option<DeathCause>,
    pub milestones: Vec<MilestoneKind>,
    pub damage: DamageReport,
}

/// Applies one tick of aging, metabolism and damage after the action ran.
///
/// Dead agents are left untouched.
pub fn advance<R: Rng>(
    agent: &mut Agent,
    exertion: Exertion,
    surroundings: Surroundings,
    config: &LifecycleConfig,
    dt: f64,
    rng: &mut R,
) -> LifecycleUpdate {
    let mut update = LifecycleUpdate::default();
    if !agent.is_alive() || dt <= 0.0 {
        return update;
    }
    let secs = dt as f32;
    let traits = agent.genome.traits;
    let sheltered = agent.is_sheltered();

    agent.age += dt;
    agent.fitness.survival_seconds += dt;
    agent.reproduction_cooldown = (agent.reproduction_cooldown - dt).max(0.0);

    agent.stats.hunger += config.hunger_rate * traits.size * secs;

    if exertion.moved > 0.0 {
        let modifier = traits.stamina_modifier.max(f32::EPSILON);
        agent.stats.stamina -= config.move_stamina_cost * traits.speed / modifier * secs;
    } else if sheltered {
        agent.stats.stamina += config.shelter_stamina_regen * secs;
    } else if exertion.resting {
        agent.stats.stamina += config.rest_stamina_regen * secs;
    }
    agent.stats.clamp();

    let damage = &mut update.damage;
    if agent.stats.hunger >= config.critical_hunger {
        damage.starvation = config.starvation_damage * secs;
    }
    if agent.stats.stamina <= config.critical_stamina {
        damage.exhaustion = config.exhaustion_damage * secs;
    }
    if !sheltered {
        damage.exposure = if surroundings.night {
            config.exposure_damage * secs
        } else {
            config.daytime_wear * secs
        };
        if surroundings
            .threat_distance
            .is_some_and(|d| d <= config.threat_contact_radius)
        {
            damage.predation = config.threat_damage * secs;
        }
    }
    agent.stats.health -= damage.total();
    if sheltered && agent.stats.hunger <= config.well_fed_threshold {
        agent.stats.health += config.health_regen * secs;
    }
    agent.stats.clamp();

    if agent.stats.health <= 0.0 {
        let cause = update.damage.dominant_cause().unwrap_or(DeathCause::OldAge);
        kill(agent, cause);
        update.died = Some(cause);
        return update;
    }
    if agent.age >= config.max_lifespan {
        kill(agent, DeathCause::OldAge);
        update.died = Some(DeathCause::OldAge);
        return update;
    }

    let previous = agent.stage;
    let next = stage_for_age(agent.age, config);
    if previous == LifeStage::Child && next != LifeStage::Child {
        update.milestones.push(MilestoneKind::ReachedAdulthood);
    }
    if previous != LifeStage::Elder && next == LifeStage::Elder {
        update.milestones.push(MilestoneKind::ReachedElderhood);
    }
    agent.stage = next;

    if agent.stage == LifeStage::Elder {
        let span = (config.max_lifespan - config.elder_age).max(f64::EPSILON);
        let pressure = ((agent.age - config.elder_age) / span).clamp(0.0, 1.0);
        let p = (config.elder_mortality * pressure * dt).clamp(0.0, 1.0);
        if p > 0.0 && rng.gen_bool(p) {
            kill(agent, DeathCause::OldAge);
            update.died = Some(DeathCause::OldAge);
        }
    }
    update
}

/// Marks the agent dead. Idempotent.
pub fn kill(agent: &mut Agent, cause: DeathCause) {
    if agent.stage == LifeStage::Dead {
        return;
    }
    agent.stage = LifeStage::Dead;
    agent.cause_of_death = Some(cause);
}

/// Reduces hunger after a successful harvest.
pub fn eat(agent: &mut Agent, config: &LifecycleConfig) -> bool {
    let first = agent.fitness.resources_gathered == 0;
    agent.stats.hunger = (agent.stats.hunger - config.eat_amount).clamp(0.0, STAT_MAX);
    agent.fitness.resources_gathered += 1;
    first
}

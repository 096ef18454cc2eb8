use super::genome::Genome;
use super::house::HouseId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of every survival stat.
pub const STAT_MAX: f32 = 100.0;

/// Stable identifier of an agent in the population roster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "npc#{}", self.0)
    }
}

/// Kinds of things an agent can sense and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Food,
    Shelter,
    Threat,
}

/// Weak reference to a world object. Resolving it may fail once the object is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: u32,
}

/// Closed set of behaviours the decision network chooses between.
///
/// The discriminant is the network output index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Wander = 0,
    SeekFood = 1,
    Eat = 2,
    Rest = 3,
    SeekShelter = 4,
    StayInShelter = 5,
}

impl Action {
    pub const COUNT: usize = 6;
    pub const ALL: [Action; Self::COUNT] = [
        Action::Wander,
        Action::SeekFood,
        Action::Eat,
        Action::Rest,
        Action::SeekShelter,
        Action::StayInShelter,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Action::Wander => "wander",
            Action::SeekFood => "seek_food",
            Action::Eat => "eat",
            Action::Rest => "rest",
            Action::SeekShelter => "seek_shelter",
            Action::StayInShelter => "stay_in_shelter",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Life stage of an agent. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeStage {
    Child,
    Adult,
    Elder,
    Dead,
}

impl LifeStage {
    #[must_use]
    pub fn is_alive(self) -> bool {
        !matches!(self, LifeStage::Dead)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LifeStage::Child => "child",
            LifeStage::Adult => "adult",
            LifeStage::Elder => "elder",
            LifeStage::Dead => "dead",
        }
    }
}

/// Why an agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    Exhaustion,
    Exposure,
    Predation,
    OldAge,
}

impl DeathCause {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DeathCause::Starvation => "starvation",
            DeathCause::Exhaustion => "exhaustion",
            DeathCause::Exposure => "exposure",
            DeathCause::Predation => "predation",
            DeathCause::OldAge => "old age",
        }
    }
}

/// Notable points in an agent's life reported to the logging collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneKind {
    ReachedAdulthood,
    ReachedElderhood,
    FirstHarvest,
    HadOffspring,
}

/// World position; `y` always comes from the terrain collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal (x/z plane) distance.
    #[must_use]
    pub fn planar_distance(&self, x: f64, z: f64) -> f64 {
        ((self.x - x).powi(2) + (self.z - z).powi(2)).sqrt()
    }
}

/// Bounded survival stats, each in `[0, STAT_MAX]`.
///
/// `hunger` grows over time: 0 is sated, 100 is starving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalStats {
    pub health: f32,
    pub hunger: f32,
    pub stamina: f32,
}

impl Default for SurvivalStats {
    fn default() -> Self {
        Self {
            health: STAT_MAX,
            hunger: 0.0,
            stamina: STAT_MAX,
        }
    }
}

impl SurvivalStats {
    pub fn clamp(&mut self) {
        self.health = self.health.clamp(0.0, STAT_MAX);
        self.hunger = self.hunger.clamp(0.0, STAT_MAX);
        self.stamina = self.stamina.clamp(0.0, STAT_MAX);
    }
}

/// Raw inputs to an agent's fitness score, accumulated while it lives.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessComponents {
    pub survival_seconds: f64,
    pub resources_gathered: u32,
    pub reproductions: u32,
}

/// An NPC. Relations to houses and targets are stored as ids only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub generation: u32,
    /// Zero, one, or two parents.
    pub parents: Vec<AgentId>,
    pub genome: Genome,
    pub stats: SurvivalStats,
    /// Elapsed simulated seconds.
    pub age: f64,
    pub stage: LifeStage,
    pub position: Position,
    /// Facing angle in radians on the x/z plane.
    pub heading: f64,
    pub house: Option<HouseId>,
    pub target: Option<TargetRef>,
    pub last_action: Action,
    /// Seconds until this agent may reproduce again.
    pub reproduction_cooldown: f64,
    pub fitness: FitnessComponents,
    pub cause_of_death: Option<DeathCause>,
    pub birth_tick: u64,
}

impl Agent {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.stage.is_alive()
    }

    #[must_use]
    pub fn is_sheltered(&self) -> bool {
        self.house.is_some()
    }
}

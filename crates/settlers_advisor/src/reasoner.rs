use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use settlers_core::brain::FeatureVector;
use settlers_core::sensors::{ABSENT_DISTANCE, FOOD_DIST, NIGHT, SHELTER_DIST};
use settlers_data::{Action, Agent, AgentId, LifeStage, STAT_MAX};

/// Snapshot of one agent's situation, detached from the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorQuery {
    pub agent: AgentId,
    pub tick: u64,
    pub health: f32,
    pub hunger: f32,
    pub stamina: f32,
    pub stage: LifeStage,
    pub night: bool,
    pub sheltered: bool,
    /// Normalized distance to the nearest food, if any was sensed.
    pub food_distance: Option<f32>,
    pub shelter_distance: Option<f32>,
}

impl AdvisorQuery {
    #[must_use]
    pub fn new(agent: &Agent, features: &FeatureVector, tick: u64) -> Self {
        let sensed = |d: f32| (d < ABSENT_DISTANCE).then_some(d);
        Self {
            agent: agent.id,
            tick,
            health: agent.stats.health,
            hunger: agent.stats.hunger,
            stamina: agent.stats.stamina,
            stage: agent.stage,
            night: features[NIGHT] > 0.5,
            sheltered: agent.is_sheltered(),
            food_distance: sensed(features[FOOD_DIST]),
            shelter_distance: sensed(features[SHELTER_DIST]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub action: Action,
    pub reasoning: String,
    pub confidence: f32,
}

impl Suggestion {
    fn new(action: Action, reasoning: &str, confidence: f32) -> Self {
        Self {
            action,
            reasoning: reasoning.to_string(),
            confidence,
        }
    }
}

#[async_trait]
pub trait ActionReasoner: Send + Sync {
    /// `None` means no opinion; the network's choice stands.
    async fn reason(&self, query: &AdvisorQuery) -> Option<Suggestion>;
}

/// Priority rules: survive, eat, get indoors at night, recover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicReasoner {
    pub critical_health: f32,
    pub high_hunger: f32,
    pub low_stamina: f32,
}

impl Default for HeuristicReasoner {
    fn default() -> Self {
        Self {
            critical_health: 0.2,
            high_hunger: 0.7,
            low_stamina: 0.2,
        }
    }
}

impl HeuristicReasoner {
    #[must_use]
    pub fn decide(&self, query: &AdvisorQuery) -> Option<Suggestion> {
        if query.stage == LifeStage::Dead {
            return None;
        }
        let health = query.health / STAT_MAX;
        let hunger = query.hunger / STAT_MAX;
        let stamina = query.stamina / STAT_MAX;

        if health < self.critical_health {
            return Some(if query.night {
                Suggestion::new(
                    Action::SeekShelter,
                    "Health is critically low, prioritizing survival",
                    0.9,
                )
            } else {
                Suggestion::new(Action::Rest, "Health is critically low, prioritizing survival", 0.9)
            });
        }
        if hunger > self.high_hunger {
            let action = match query.food_distance {
                Some(d) if d <= 0.1 => Action::Eat,
                _ => Action::SeekFood,
            };
            return Some(Suggestion::new(action, "Hungry, need to find food", 0.85));
        }
        if query.night && !query.sheltered {
            return Some(Suggestion::new(
                Action::SeekShelter,
                "Night time, need shelter for safety",
                0.9,
            ));
        }
        if stamina < self.low_stamina {
            return Some(Suggestion::new(Action::Rest, "Stamina is low, need to rest", 0.8));
        }
        None
    }
}

#[async_trait]
impl ActionReasoner for HeuristicReasoner {
    async fn reason(&self, query: &AdvisorQuery) -> Option<Suggestion> {
        self.decide(query)
    }
}

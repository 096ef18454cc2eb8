use super::agent::{AgentId, LifeStage, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a house in the house registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct HouseId(pub u32);

impl fmt::Display for HouseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "house#{}", self.0)
    }
}

/// A shelter. Holds occupant ids, never the agents themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub position: Position,
    pub capacity: usize,
    pub occupants: Vec<AgentId>,
}

impl House {
    #[must_use]
    pub fn new(id: HouseId, position: Position, capacity: usize) -> Self {
        Self {
            id,
            position,
            capacity,
            occupants: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn has_space(&self) -> bool {
        self.occupants.len() < self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.occupants.len() >= self.capacity
    }

    #[must_use]
    pub fn hosts(&self, agent: AgentId) -> bool {
        self.occupants.contains(&agent)
    }
}

/// Who is inside a house right now.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Occupancy {
    pub count: usize,
    pub stages: Vec<LifeStage>,
}

impl Occupancy {
    #[must_use]
    pub fn all_adults(&self) -> bool {
        !self.stages.is_empty() && self.stages.iter().all(|s| *s == LifeStage::Adult)
    }
}

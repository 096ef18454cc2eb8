use crate::brain::PARAMETER_COUNT;
use crate::lifecycle;
use settlers_data::{Agent, AgentId, Genome, LifeStage, Position};

/// Newborn with a zero genome at `(x, z)` on flat ground.
pub fn agent_at(id: u64, x: f64, z: f64) -> Agent {
    lifecycle::create_agent(
        AgentId(id),
        Genome::zeroed(PARAMETER_COUNT),
        0,
        Vec::new(),
        Position::new(x, 0.0, z),
        0,
    )
}

/// Adult, cooldown elapsed, ready to reproduce.
pub fn adult_at(id: u64, x: f64, z: f64) -> Agent {
    let mut agent = agent_at(id, x, z);
    agent.age = 100.0;
    agent.stage = LifeStage::Adult;
    agent
}

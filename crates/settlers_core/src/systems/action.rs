//! Action handler table.
//!
//! Each `Action` maps to one handler through an exhaustive match. Handlers
//! only touch the acting agent; anything shared (food, house slots) comes
//! back as an intent for the commit phase.

use crate::config::LifecycleConfig;
use crate::interfaces::{Target, Terrain};
use crate::lifecycle::Exertion;
use crate::sensors::Observation;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use settlers_data::{Action, Agent, HouseId, TargetKind, TargetRef};
use std::f64::consts::PI;

/// Largest heading change per second while wandering, in radians.
const WANDER_TURN: f64 = PI / 2.0;

pub struct ActionContext<'a> {
    pub terrain: &'a dyn Terrain,
    pub lifecycle: &'a LifecycleConfig,
    pub dt: f64,
    /// Half extents of the walkable area, centred on the origin.
    pub half_width: f64,
    pub half_depth: f64,
}

/// Effects of one action: body exertion plus shared-state intents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActionOutput {
    pub exertion: Exertion,
    /// Food source to take a serving from.
    pub harvest: Option<u32>,
    /// House slot to claim.
    pub claim: Option<HouseId>,
    /// House slot given up this tick.
    pub release: Option<HouseId>,
}

pub type ActionHandler = fn(&mut Agent, &Observation, &ActionContext, &mut ChaCha8Rng) -> ActionOutput;

#[must_use]
pub fn handler_for(action: Action) -> ActionHandler {
    match action {
        Action::Wander => wander,
        Action::SeekFood => seek_food,
        Action::Eat => eat,
        Action::Rest => rest,
        Action::SeekShelter => seek_shelter,
        Action::StayInShelter => stay_in_shelter,
    }
}

/// Runs the handler for `action` and records it as the agent's last action.
pub fn execute(
    action: Action,
    agent: &mut Agent,
    obs: &Observation,
    ctx: &ActionContext,
    rng: &mut ChaCha8Rng,
) -> ActionOutput {
    agent.last_action = action;
    handler_for(action)(agent, obs, ctx, rng)
}

fn wander(agent: &mut Agent, _obs: &Observation, ctx: &ActionContext, rng: &mut ChaCha8Rng) -> ActionOutput {
    let mut out = ActionOutput {
        release: leave_house(agent),
        ..Default::default()
    };
    agent.target = None;
    let turn = WANDER_TURN * ctx.dt;
    if turn > 0.0 {
        agent.heading += rng.gen_range(-turn..=turn);
    }
    let step = step_length(agent, ctx);
    let (x, z) = (
        agent.position.x + agent.heading.cos() * step,
        agent.position.z + agent.heading.sin() * step,
    );
    out.exertion.moved = move_to(agent, x, z, ctx);
    out
}

fn seek_food(agent: &mut Agent, obs: &Observation, ctx: &ActionContext, rng: &mut ChaCha8Rng) -> ActionOutput {
    match obs.food {
        Some(food) => {
            let mut out = ActionOutput {
                release: leave_house(agent),
                ..Default::default()
            };
            out.exertion.moved = approach(agent, &food, ctx.lifecycle.eat_radius * 0.5, ctx);
            out
        }
        None => wander(agent, obs, ctx, rng),
    }
}

fn eat(agent: &mut Agent, obs: &Observation, ctx: &ActionContext, rng: &mut ChaCha8Rng) -> ActionOutput {
    match obs.food {
        Some(food) if food.distance_from(agent.position.x, agent.position.z) <= ctx.lifecycle.eat_radius => {
            agent.target = Some(food.target);
            ActionOutput {
                release: leave_house(agent),
                harvest: Some(food.target.id),
                ..Default::default()
            }
        }
        _ => seek_food(agent, obs, ctx, rng),
    }
}

fn rest(_agent: &mut Agent, _obs: &Observation, _ctx: &ActionContext, _rng: &mut ChaCha8Rng) -> ActionOutput {
    ActionOutput {
        exertion: Exertion {
            moved: 0.0,
            resting: true,
        },
        ..Default::default()
    }
}

fn seek_shelter(agent: &mut Agent, obs: &Observation, ctx: &ActionContext, rng: &mut ChaCha8Rng) -> ActionOutput {
    if agent.is_sheltered() {
        return rest(agent, obs, ctx, rng);
    }
    let Some(shelter) = obs.shelter else {
        return wander(agent, obs, ctx, rng);
    };
    let house = HouseId(shelter.target.id);
    agent.target = Some(shelter.target);
    if shelter.distance_from(agent.position.x, agent.position.z) <= ctx.lifecycle.shelter_radius {
        return ActionOutput {
            claim: Some(house),
            ..Default::default()
        };
    }
    ActionOutput {
        exertion: Exertion {
            moved: approach(agent, &shelter, 0.0, ctx),
            resting: false,
        },
        ..Default::default()
    }
}

fn stay_in_shelter(agent: &mut Agent, obs: &Observation, ctx: &ActionContext, rng: &mut ChaCha8Rng) -> ActionOutput {
    if agent.is_sheltered() {
        return rest(agent, obs, ctx, rng);
    }
    // Outdoors: slip into a house within reach, otherwise rest where it stands.
    match obs.shelter {
        Some(shelter)
            if shelter.distance_from(agent.position.x, agent.position.z) <= ctx.lifecycle.shelter_radius =>
        {
            agent.target = Some(shelter.target);
            ActionOutput {
                claim: Some(HouseId(shelter.target.id)),
                ..Default::default()
            }
        }
        _ => rest(agent, obs, ctx, rng),
    }
}

fn leave_house(agent: &mut Agent) -> Option<HouseId> {
    agent.house.take()
}

fn step_length(agent: &Agent, ctx: &ActionContext) -> f64 {
    ctx.lifecycle.walk_speed * f64::from(agent.genome.traits.speed) * ctx.dt
}

/// Walks toward `target`, stopping `stop_at` short of it. Returns distance covered.
fn approach(agent: &mut Agent, target: &Target, stop_at: f64, ctx: &ActionContext) -> f64 {
    if target.target.kind != TargetKind::Threat {
        agent.target = Some(TargetRef {
            kind: target.target.kind,
            id: target.target.id,
        });
    }
    let (dx, dz) = (target.x - agent.position.x, target.z - agent.position.z);
    let dist = (dx * dx + dz * dz).sqrt();
    let remaining = dist - stop_at;
    if remaining <= f64::EPSILON {
        return 0.0;
    }
    agent.heading = dz.atan2(dx);
    let step = step_length(agent, ctx).min(remaining);
    move_to(
        agent,
        agent.position.x + dx / dist * step,
        agent.position.z + dz / dist * step,
        ctx,
    )
}

/// Moves within bounds and re-queries ground height. Returns distance covered.
fn move_to(agent: &mut Agent, x: f64, z: f64, ctx: &ActionContext) -> f64 {
    let x = x.clamp(-ctx.half_width, ctx.half_width);
    let z = z.clamp(-ctx.half_depth, ctx.half_depth);
    let moved = agent.position.planar_distance(x, z);
    agent.position.x = x;
    agent.position.z = z;
    agent.position.y = ctx.terrain.height(x, z);
    moved
}

//! Error taxonomy for the adaptive agent core.
//!
//! Most of these are recovered locally where they arise (a malformed genome
//! falls back to `Action::Wander`, a duplicate fitness record is ignored, an
//! out-of-range trait is clamped). Only [`CoreError::EmptyPopulation`] is
//! surfaced by `World::update`.

use settlers_data::{AgentId, HouseId, Traits};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Weight vector length does not match the network topology.
    #[error("Malformed genome: expected {expected} weights, found {actual}")]
    MalformedGenome { expected: usize, actual: usize },

    /// Fitness for this agent was already recorded.
    #[error("Fitness already recorded for {0}")]
    DuplicateFitnessRecord(AgentId),

    /// A trait left its documented range.
    #[error("Trait {name} = {value} outside [{min}, {max}]")]
    InvalidTraitBounds {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Another claim took the last slot first.
    #[error("House slot conflict on {0}")]
    HouseClaimConflict(HouseId),

    /// Selection was requested with nothing to select from.
    #[error("Cannot reseed: no live agents or recorded genomes")]
    EmptyPopulation,
}

impl CoreError {
    /// The error a trait clamped back into bounds would have raised.
    #[must_use]
    pub fn trait_out_of_bounds(name: &'static str, value: f32) -> Option<Self> {
        Traits::bounds(name).map(|bounds| CoreError::InvalidTraitBounds {
            name,
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

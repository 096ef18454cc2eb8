//! # Settlers Core
//!
//! Adaptive agent core for the settlers simulation.
//!
//! ## Modules
//!
//! - [`brain`]: fixed-topology decision network and genetic operators
//! - [`sensors`]: feature vector assembly from agent state and world queries
//! - [`lifecycle`]: aging, survival stats and death
//! - [`evolution`]: fitness bookkeeping, selection and reseeding
//! - [`systems`]: action handlers, reproduction coordinator, statistics
//! - [`interfaces`]: traits for terrain, spatial and shelter collaborators
//! - [`environment`]: reference collaborator implementations
//! - [`world`]: per-tick orchestration
//! - [`config`]: simulation configuration
//! - [`metrics`]: counters and logging setup
//!
//! ## Quick start
//!
//! ```
//! use settlers_core::config::AppConfig;
//! use settlers_core::world::World;
//!
//! let mut config = AppConfig::default();
//! config.world.seed = Some(7);
//! config.world.initial_population = 6;
//! config.world.min_population = 0;
//! let mut world = World::new(config).expect("valid config");
//! world.update().expect("population present");
//! assert!(world.tick() == 1);
//! ```

pub mod advisor;
pub mod brain;
pub mod clock;
pub mod config;
pub mod environment;
pub mod error;
pub mod events;
pub mod evolution;
pub mod interfaces;
pub mod lifecycle;
pub mod metrics;
pub mod sensors;
pub mod systems;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{CoreError, CoreResult};
pub use settlers_data as data;

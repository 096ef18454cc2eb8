//! Plain data types shared by the settlers simulation crates.
//!
//! Everything here is inert: identifiers, the genome layout, agent and house
//! records, and the small enums the decision network and lifecycle speak in.
//! Behaviour lives in `settlers_core`.

pub mod data;

pub use data::agent::*;
pub use data::genome::*;
pub use data::house::*;
pub use data::stats::*;

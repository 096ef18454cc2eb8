//! # Settlers IO
//!
//! Persistence layer for the settlers simulation.
//!
//! - Versioned genome records (rkyv binary, JSON, HexDNA)
//! - Gzip population snapshots written atomically
//! - JSONL lifecycle history fed from a background writer thread

/// Error types and result aliases for I/O operations
pub mod error;
/// Versioned genome codec
pub mod genome;
/// Lifecycle event log
pub mod history;
/// Whole-population save files
pub mod snapshot;

pub use error::{IoError, Result};
pub use genome::{load_genome, save_genome, GenomeRecord, NamedTrait, GENOME_SCHEMA_VERSION};
pub use history::HistoryLogger;
pub use snapshot::{PopulationSnapshot, SnapshotEntry, SNAPSHOT_SCHEMA_VERSION};

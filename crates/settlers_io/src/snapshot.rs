//! Population save files.
//!
//! A snapshot is gzip-compressed JSON. It is written to a temporary sibling
//! file first and renamed into place, so an interrupted save never leaves a
//! truncated file behind.

use crate::error::{IoError, Result};
use crate::genome::GenomeRecord;
use chrono::{DateTime, FixedOffset, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use settlers_core::evolution::ScoredGenome;
use settlers_core::world::World;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Current snapshot format.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub genome: GenomeRecord,
    pub fitness: f64,
    pub generation: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub schema_version: u32,
    /// RFC 3339 time of capture.
    pub saved_at: String,
    /// `AppConfig::fingerprint` of the run that produced the genomes.
    pub config_fingerprint: String,
    pub tick: u64,
    pub generation: u32,
    pub best_fitness: f64,
    /// Best first.
    pub entries: Vec<SnapshotEntry>,
    /// SHA-256 of the serialized entries, hex encoded.
    pub checksum: String,
}

impl PopulationSnapshot {
    /// Captures live agents and the fitness archive, keeping at most `limit`
    /// genomes.
    #[must_use]
    pub fn capture(world: &World, limit: usize) -> Self {
        let entries: Vec<SnapshotEntry> = world
            .scored_genomes()
            .into_iter()
            .take(limit)
            .map(|s| SnapshotEntry {
                genome: GenomeRecord::from(&s.genome),
                fitness: s.fitness,
                generation: s.generation,
            })
            .collect();
        let mut snapshot = Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            config_fingerprint: world.config.fingerprint(),
            tick: world.tick(),
            generation: world.engine().current_generation(),
            best_fitness: world.engine().best_fitness(),
            entries,
            checksum: String::new(),
        };
        snapshot.refresh_checksum();
        snapshot
    }

    /// Recomputes the checksum after `entries` changed.
    pub fn refresh_checksum(&mut self) {
        self.checksum = checksum(&self.entries);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn saved_at(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.saved_at)
            .map_err(|e| IoError::validation(format!("Invalid timestamp: {}", e)))
    }

    /// Whether the genomes were evolved under the same simulation rules.
    #[must_use]
    pub fn matches_config(&self, fingerprint: &str) -> bool {
        self.config_fingerprint == fingerprint
    }

    /// Decodes every usable entry with its fitness and generation. Records
    /// that fail to decode are logged and skipped.
    #[must_use]
    pub fn scored_genomes(&self) -> Vec<ScoredGenome> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match entry.genome.clone().into_genome() {
                Ok(genome) => Some(ScoredGenome {
                    genome,
                    fitness: entry.fitness,
                    generation: entry.generation,
                }),
                Err(e) => {
                    tracing::warn!(entry = i, error = %e, "Skipping snapshot genome");
                    None
                }
            })
            .collect()
    }

    /// Restores the saved population into `world`. Returns the number of
    /// live agents restored.
    pub fn restore_into(&self, world: &mut World) -> Result<usize> {
        let restored =
            world.restore_population(self.scored_genomes(), self.generation, self.best_fitness)?;
        Ok(restored)
    }

    /// Writes the snapshot atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(path);
        let json = serde_json::to_vec(self)?;

        let file = File::create(&tmp)
            .map_err(|e| IoError::FileSystem(e).with_context(format!("creating {:?}", tmp)))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| IoError::compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| IoError::compression(e.to_string()))?;

        std::fs::rename(&tmp, path).map_err(|e| {
            IoError::FileSystem(e).with_context(format!("moving snapshot into {:?}", path))
        })?;
        tracing::info!(path = %path.display(), genomes = self.entries.len(), "Population saved");
        Ok(())
    }

    /// Reads and verifies a snapshot written by [`Self::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| IoError::FileSystem(e).with_context(format!("opening {:?}", path)))?;
        let mut decoder = GzDecoder::new(file);
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .map_err(|e| IoError::compression(e.to_string()))?;

        let snapshot: Self = serde_json::from_slice(&json)?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(IoError::UnsupportedVersion {
                kind: "snapshot",
                found: snapshot.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        if checksum(&snapshot.entries) != snapshot.checksum {
            return Err(IoError::validation("Snapshot checksum mismatch"));
        }
        Ok(snapshot)
    }
}

fn checksum(entries: &[SnapshotEntry]) -> String {
    let json = serde_json::to_vec(entries).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hex::encode(hasher.finalize())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

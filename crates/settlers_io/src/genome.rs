//! Versioned on-disk form of a genome.
//!
//! A record carries its schema version, the flat weight array and the traits
//! as `(name, value)` pairs so that adding a trait does not break old files.
//! Decoding rejects unknown versions and wrong weight counts, and clamps
//! out-of-range traits.

use crate::error::{IoError, Result};
use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use settlers_core::brain::GenomeLogic;
use settlers_data::{Genome, Traits};
use std::path::Path;
use uuid::Uuid;

/// Current genome record format.
pub const GENOME_SCHEMA_VERSION: u32 = 1;

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct NamedTrait {
    pub name: String,
    pub value: f32,
}

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct GenomeRecord {
    pub schema_version: u32,
    pub lineage_id: Uuid,
    pub weights: Vec<f32>,
    pub traits: Vec<NamedTrait>,
}

impl From<&Genome> for GenomeRecord {
    fn from(genome: &Genome) -> Self {
        Self {
            schema_version: GENOME_SCHEMA_VERSION,
            lineage_id: genome.lineage_id,
            weights: genome.weights.clone(),
            traits: genome
                .traits
                .named()
                .iter()
                .map(|(name, value)| NamedTrait {
                    name: (*name).to_string(),
                    value: *value,
                })
                .collect(),
        }
    }
}

impl GenomeRecord {
    /// Decodes into a genome the current network can evaluate.
    ///
    /// Traits missing from the record keep their defaults; unknown trait
    /// names are ignored.
    pub fn into_genome(self) -> Result<Genome> {
        if self.schema_version != GENOME_SCHEMA_VERSION {
            return Err(IoError::UnsupportedVersion {
                kind: "genome",
                found: self.schema_version,
                supported: GENOME_SCHEMA_VERSION,
            });
        }

        let mut traits = Traits::default();
        for t in &self.traits {
            if !traits.set(&t.name, t.value) {
                tracing::debug!(trait_name = %t.name, "Ignoring unknown trait");
            }
        }
        for (name, value) in traits.clamp_in_place() {
            tracing::debug!(trait_name = name, value, "Clamped loaded trait");
        }

        let genome = Genome::new(self.weights, traits, self.lineage_id);
        genome.validate()?;
        Ok(genome)
    }

    /// Binary form (rkyv archive).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<_, 4096>(self)
            .map_err(|e| IoError::rkyv(format!("serialization failed: {:?}", e)))?;
        Ok(bytes.into_vec())
    }

    /// Validates and decodes a binary archive. The input need not be aligned.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(IoError::validation("Empty genome archive"));
        }
        let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        let archived = rkyv::check_archived_root::<Self>(aligned.as_slice())
            .map_err(|e| IoError::rkyv(format!("validation failed: {:?}", e)))?;
        let mut deserializer = SharedDeserializeMap::default();
        archived
            .deserialize(&mut deserializer)
            .map_err(|e| IoError::rkyv(format!("deserialization failed: {:?}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Err(IoError::validation("Empty JSON string"));
        }
        Ok(serde_json::from_str(json)?)
    }

    /// HexDNA: hex-encoded JSON, convenient for copy and paste.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.to_json()?))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| IoError::validation(format!("Invalid hex encoding: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| IoError::validation(format!("Invalid UTF-8 in hex: {}", e)))?;
        Self::from_json(&json)
    }
}

/// Writes `genome` as a binary record.
pub fn save_genome<P: AsRef<Path>>(genome: &Genome, path: P) -> Result<()> {
    let bytes = GenomeRecord::from(genome).to_bytes()?;
    std::fs::write(&path, bytes).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("writing genome to {:?}", path.as_ref()))
    })
}

/// Reads a binary record written by [`save_genome`].
pub fn load_genome<P: AsRef<Path>>(path: P) -> Result<Genome> {
    let bytes = std::fs::read(&path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading genome from {:?}", path.as_ref()))
    })?;
    GenomeRecord::from_bytes(&bytes)?.into_genome()
}

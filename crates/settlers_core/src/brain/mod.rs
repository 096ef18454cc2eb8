pub mod crossover;
pub mod forward;
pub mod mutation;
pub mod topology;

use crate::error::CoreResult;
pub use settlers_data::{Action, Genome, Traits};
use rand::Rng;

pub use topology::{create_genome_random_with_rng, layer_spans, LayerSpan, PARAMETER_COUNT};

pub const INPUT_LABELS: [&str; 18] = [
    "Health",
    "Hunger",
    "Stamina",
    "Age",
    "FoodDist",
    "FoodDX",
    "FoodDZ",
    "ShelterDist",
    "ShelterDX",
    "ShelterDZ",
    "ThreatDist",
    "ThreatDX",
    "ThreatDZ",
    "DayPhase",
    "Night",
    "Exposed",
    "CanReproduce",
    "Sheltered",
];

pub const OUTPUT_LABELS: [&str; 6] = [
    "Wander",
    "SeekFood",
    "Eat",
    "Rest",
    "SeekShelter",
    "StayInShelter",
];

pub const NETWORK_INPUTS: usize = INPUT_LABELS.len();
pub const NETWORK_OUTPUTS: usize = OUTPUT_LABELS.len();

/// Neurons per layer, input first.
pub const LAYER_SIZES: [usize; 5] = [NETWORK_INPUTS, 64, 64, 32, NETWORK_OUTPUTS];
pub const LAYER_COUNT: usize = LAYER_SIZES.len() - 1;

/// Action taken when the genome cannot be evaluated.
pub const FALLBACK_ACTION: Action = Action::Wander;

/// Sensor input for one agent, every entry in `[-1, 1]`.
pub type FeatureVector = [f32; NETWORK_INPUTS];

/// Behaviour attached to a genome: evaluation and genetic operators.
pub trait GenomeLogic {
    fn new_random_with_rng<R: Rng>(rng: &mut R) -> Self;

    /// Fails with `MalformedGenome` when the weight count is wrong.
    fn validate(&self) -> CoreResult<()>;

    fn evaluate(&self, features: &FeatureVector) -> CoreResult<Action>;
    fn scores(&self, features: &FeatureVector) -> CoreResult<[f32; NETWORK_OUTPUTS]>;

    fn crossover_with_rng<R: Rng>(&self, other: &Genome, rng: &mut R) -> CoreResult<Genome>;
    fn mutate_with_rng<R: Rng>(&mut self, rate: f32, strength: f32, trait_scale: f32, rng: &mut R);
}

impl GenomeLogic for Genome {
    fn new_random_with_rng<R: Rng>(rng: &mut R) -> Self {
        topology::create_genome_random_with_rng(rng)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.weights.len() == PARAMETER_COUNT {
            Ok(())
        } else {
            Err(crate::error::CoreError::MalformedGenome {
                expected: PARAMETER_COUNT,
                actual: self.weights.len(),
            })
        }
    }

    fn evaluate(&self, features: &FeatureVector) -> CoreResult<Action> {
        forward::evaluate(&self.weights, features)
    }

    fn scores(&self, features: &FeatureVector) -> CoreResult<[f32; NETWORK_OUTPUTS]> {
        forward::scores(&self.weights, features)
    }

    fn crossover_with_rng<R: Rng>(&self, other: &Genome, rng: &mut R) -> CoreResult<Genome> {
        crossover::genome_crossover_with_rng(self, other, rng)
    }

    fn mutate_with_rng<R: Rng>(&mut self, rate: f32, strength: f32, trait_scale: f32, rng: &mut R) {
        mutation::mutate_with_rng(self, rate, strength, trait_scale, rng)
    }
}

use super::*;
use rand::Rng;
use settlers_data::{Genome, Traits};
use uuid::Uuid;

/// Dense layer geometry inside the flat weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpan {
    pub inputs: usize,
    pub outputs: usize,
    /// Start of the `[outputs][inputs]` row-major weight matrix.
    pub weight_offset: usize,
    /// Start of the `outputs` bias vector, directly after the matrix.
    pub bias_offset: usize,
}

impl LayerSpan {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inputs * self.outputs + self.outputs
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const fn compute_parameter_count() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i + 1 < LAYER_SIZES.len() {
        total += LAYER_SIZES[i] * LAYER_SIZES[i + 1] + LAYER_SIZES[i + 1];
        i += 1;
    }
    total
}

/// Required genome length for the fixed topology.
pub const PARAMETER_COUNT: usize = compute_parameter_count();

/// Layer spans in evaluation order.
#[must_use]
pub fn layer_spans() -> [LayerSpan; LAYER_COUNT] {
    let mut spans = [LayerSpan {
        inputs: 0,
        outputs: 0,
        weight_offset: 0,
        bias_offset: 0,
    }; LAYER_COUNT];
    let mut offset = 0;
    for (i, span) in spans.iter_mut().enumerate() {
        let inputs = LAYER_SIZES[i];
        let outputs = LAYER_SIZES[i + 1];
        *span = LayerSpan {
            inputs,
            outputs,
            weight_offset: offset,
            bias_offset: offset + inputs * outputs,
        };
        offset += span.len();
    }
    spans
}

/// Random weights drawn uniformly from `±1/sqrt(fan_in)` per layer.
pub fn random_weights_with_rng<R: Rng>(rng: &mut R) -> Vec<f32> {
    let mut weights = Vec::with_capacity(PARAMETER_COUNT);
    for span in layer_spans() {
        let bound = 1.0 / (span.inputs as f32).sqrt();
        for _ in 0..span.len() {
            weights.push(rng.gen_range(-bound..=bound));
        }
    }
    weights
}

pub fn random_traits_with_rng<R: Rng>(rng: &mut R) -> Traits {
    Traits {
        speed: rng.gen_range(Traits::SPEED.min..=Traits::SPEED.max),
        size: rng.gen_range(0.8..=1.2),
        stamina_modifier: rng.gen_range(Traits::STAMINA_MODIFIER.min..=Traits::STAMINA_MODIFIER.max),
        vision_range: rng.gen_range(Traits::VISION_RANGE.min..=20.0),
    }
}

/// Founding genome for generation zero, with a fresh lineage id.
pub fn create_genome_random_with_rng<R: Rng>(rng: &mut R) -> Genome {
    let weights = random_weights_with_rng(rng);
    let traits = random_traits_with_rng(rng);
    Genome::new(weights, traits, Uuid::from_u128(rng.gen::<u128>()))
}

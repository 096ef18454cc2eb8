use crate::error::{CoreError, CoreResult};
use rand::Rng;
use settlers_data::{Genome, Traits};

/// Uniform crossover: each weight comes from `a` with probability 0.5, else from `b`.
///
/// Traits are averaged and clamped. The lineage id is inherited from one parent
/// at random. Parents of different lengths are rejected.
pub fn genome_crossover_with_rng<R: Rng>(a: &Genome, b: &Genome, rng: &mut R) -> CoreResult<Genome> {
    if a.weights.len() != b.weights.len() {
        return Err(CoreError::MalformedGenome {
            expected: a.weights.len(),
            actual: b.weights.len(),
        });
    }

    let weights = a
        .weights
        .iter()
        .zip(&b.weights)
        .map(|(&wa, &wb)| if rng.gen_bool(0.5) { wa } else { wb })
        .collect();

    let traits = blend_traits(&a.traits, &b.traits);
    let lineage_id = if rng.gen_bool(0.5) {
        a.lineage_id
    } else {
        b.lineage_id
    };

    Ok(Genome::new(weights, traits, lineage_id))
}

/// Per-trait mean of both parents, clamped into bounds.
#[must_use]
pub fn blend_traits(a: &Traits, b: &Traits) -> Traits {
    let mut child = Traits {
        speed: (a.speed + b.speed) * 0.5,
        size: (a.size + b.size) * 0.5,
        stamina_modifier: (a.stamina_modifier + b.stamina_modifier) * 0.5,
        vision_range: (a.vision_range + b.vision_range) * 0.5,
    };
    for (name, value) in child.clamp_in_place() {
        if let Some(err) = CoreError::trait_out_of_bounds(name, value) {
            tracing::debug!(error = %err, "Clamped blended trait");
        }
    }
    child
}

use crate::error::CoreError;
use rand::Rng;
use rand_distr::StandardNormal;
use settlers_data::{Genome, Traits};

/// Mutated weights are kept within this magnitude.
pub const WEIGHT_LIMIT: f32 = 5.0;

/// Gaussian point mutation.
///
/// Each weight, with probability `rate`, gains `N(0, 1) * strength`. Each trait,
/// with the same probability, gains `N(0, 1) * strength * trait_scale * span`
/// and is clamped back into bounds. The genome length never changes.
pub fn mutate_with_rng<R: Rng>(
    genome: &mut Genome,
    rate: f32,
    strength: f32,
    trait_scale: f32,
    rng: &mut R,
) {
    if rate <= 0.0 {
        return;
    }
    let rate = f64::from(rate.min(1.0));

    for w in &mut genome.weights {
        if rng.gen_bool(rate) {
            let noise: f32 = rng.sample(StandardNormal);
            *w = (*w + noise * strength).clamp(-WEIGHT_LIMIT, WEIGHT_LIMIT);
        }
    }

    for name in Traits::NAMES {
        if !rng.gen_bool(rate) {
            continue;
        }
        let (Some(bounds), Some(value)) = (Traits::bounds(name), genome.traits.get(name)) else {
            continue;
        };
        let noise: f32 = rng.sample(StandardNormal);
        genome
            .traits
            .set(name, value + noise * strength * trait_scale * bounds.span());
    }

    for (name, value) in genome.traits.clamp_in_place() {
        if let Some(err) = CoreError::trait_out_of_bounds(name, value) {
            tracing::debug!(error = %err, "Clamped mutated trait");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_rate_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let original = Genome::new(vec![0.3; 32], Traits::default(), uuid::Uuid::nil());
        let mut genome = original.clone();
        mutate_with_rng(&mut genome, 0.0, 1.0, 1.0, &mut rng);
        assert_eq!(genome, original);
    }

    #[test]
    fn test_full_rate_changes_weights_and_keeps_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut genome = Genome::new(vec![0.0; 32], Traits::default(), uuid::Uuid::nil());
        mutate_with_rng(&mut genome, 1.0, 0.5, 0.1, &mut rng);
        assert_eq!(genome.weights.len(), 32);
        assert!(genome.weights.iter().any(|w| *w != 0.0));
        assert!(genome.weights.iter().all(|w| w.abs() <= WEIGHT_LIMIT));
    }

    #[test]
    fn test_huge_strength_keeps_traits_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut genome = Genome::new(vec![0.0; 4], Traits::default(), uuid::Uuid::nil());
        for _ in 0..50 {
            mutate_with_rng(&mut genome, 1.0, 100.0, 1.0, &mut rng);
            assert!(genome.traits.is_within_bounds());
        }
    }
}

//! Evolution engine: fitness bookkeeping, genetic operators and reseeding.

use crate::brain::GenomeLogic;
use crate::config::{EvolutionConfig, SelectionPolicy};
use crate::error::{CoreError, CoreResult};
use crate::lifecycle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use settlers_data::{Agent, AgentId, FitnessComponents, Genome};
use std::collections::HashSet;

/// A genome with the fitness it earned and the generation it belonged to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredGenome {
    pub genome: Genome,
    pub fitness: f64,
    pub generation: u32,
}

/// Genome produced by [`EvolutionEngine::reseed_with_rng`].
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub genome: Genome,
    pub generation: u32,
    /// Copied verbatim from the pool.
    pub elite: bool,
}

#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    config: EvolutionConfig,
    recorded: HashSet<AgentId>,
    /// Best recorded genomes, fitness descending.
    archive: Vec<ScoredGenome>,
    current_generation: u32,
    best_fitness: f64,
}

impl EvolutionEngine {
    #[must_use]
    pub fn new(config: EvolutionConfig) -> Self {
        Self {
            config,
            recorded: HashSet::new(),
            archive: Vec::new(),
            current_generation: 0,
            best_fitness: 0.0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    #[must_use]
    pub fn current_generation(&self) -> u32 {
        self.current_generation
    }

    #[must_use]
    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    #[must_use]
    pub fn archive(&self) -> &[ScoredGenome] {
        &self.archive
    }

    #[must_use]
    pub fn recorded_count(&self) -> usize {
        self.recorded.len()
    }

    #[must_use]
    pub fn has_record(&self, agent: AgentId) -> bool {
        self.recorded.contains(&agent)
    }

    /// Raises the generation counter when a newer generation appears.
    pub fn observe_generation(&mut self, generation: u32) {
        if generation > self.current_generation {
            self.current_generation = generation;
            tracing::info!(generation, "New generation reached");
        }
    }

    /// Carries records over from a previous run: best fitness, the generation
    /// counter and genomes worth keeping for later reseeds.
    pub fn seed_history(&mut self, best_fitness: f64, generation: u32, archived: Vec<ScoredGenome>) {
        if best_fitness > self.best_fitness {
            self.best_fitness = best_fitness;
        }
        self.observe_generation(generation);
        for scored in archived {
            self.archive_genome(scored);
        }
    }

    #[must_use]
    pub fn fitness_of(&self, components: &FitnessComponents) -> f64 {
        lifecycle::fitness(components, &self.config.fitness_weights)
    }

    /// Records an agent's final fitness. A second call for the same id is
    /// rejected with `DuplicateFitnessRecord` and changes nothing.
    pub fn record_fitness(
        &mut self,
        agent: AgentId,
        generation: u32,
        components: &FitnessComponents,
        genome: &Genome,
    ) -> CoreResult<f64> {
        if !self.recorded.insert(agent) {
            tracing::warn!(%agent, "Duplicate fitness record ignored");
            return Err(CoreError::DuplicateFitnessRecord(agent));
        }
        let fitness = self.fitness_of(components);
        if fitness > self.best_fitness {
            self.best_fitness = fitness;
        }
        self.observe_generation(generation);
        self.archive_genome(ScoredGenome {
            genome: genome.clone(),
            fitness,
            generation,
        });
        Ok(fitness)
    }

    /// [`Self::record_fitness`] for a whole agent record.
    pub fn record_agent(&mut self, agent: &Agent) -> CoreResult<f64> {
        self.record_fitness(agent.id, agent.generation, &agent.fitness, &agent.genome)
    }

    fn archive_genome(&mut self, scored: ScoredGenome) {
        let at = self
            .archive
            .partition_point(|s| s.fitness.total_cmp(&scored.fitness).is_ge());
        if at >= self.config.archive_capacity {
            return;
        }
        self.archive.insert(at, scored);
        self.archive.truncate(self.config.archive_capacity);
    }

    /// Uniform crossover followed by nothing else.
    pub fn crossover_with_rng<R: Rng>(
        &self,
        a: &Genome,
        b: &Genome,
        rng: &mut R,
    ) -> CoreResult<Genome> {
        a.crossover_with_rng(b, rng)
    }

    /// Mutates with the configured rate and strength.
    pub fn mutate_with_rng<R: Rng>(&self, genome: &mut Genome, rng: &mut R) {
        self.mutate_with_params(
            genome,
            self.config.mutation_rate,
            self.config.mutation_strength,
            rng,
        );
    }

    pub fn mutate_with_params<R: Rng>(
        &self,
        genome: &mut Genome,
        rate: f32,
        strength: f32,
        rng: &mut R,
    ) {
        genome.mutate_with_rng(rate, strength, self.config.trait_mutation_scale, rng);
    }

    /// Crossover then mutation: the genome a child receives.
    pub fn breed_with_rng<R: Rng>(&self, a: &Genome, b: &Genome, rng: &mut R) -> CoreResult<Genome> {
        let mut child = self.crossover_with_rng(a, b, rng)?;
        self.mutate_with_rng(&mut child, rng);
        Ok(child)
    }

    /// Index of a parent drawn from `pool` under the configured policy.
    ///
    /// Returns `None` only for an empty pool.
    pub fn select_parent_with_rng<R: Rng>(&self, pool: &[ScoredGenome], rng: &mut R) -> Option<usize> {
        select_index(self.config.selection, pool, rng)
    }

    /// Builds `target` genomes from the live population and the archive.
    ///
    /// The top `max(1, round(elite_fraction * target))` candidates are copied
    /// verbatim; remaining slots are bred from selected parent pairs.
    pub fn reseed_with_rng<R: Rng>(
        &mut self,
        live: Vec<ScoredGenome>,
        target: usize,
        rng: &mut R,
    ) -> CoreResult<Vec<Seed>> {
        let mut pool = live;
        pool.extend(self.archive.iter().cloned());
        if pool.is_empty() {
            return Err(CoreError::EmptyPopulation);
        }
        pool.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let elite_count = ((self.config.elite_fraction * target as f32).round() as usize)
            .max(1)
            .min(target)
            .min(pool.len());

        let mut seeds: Vec<Seed> = pool
            .iter()
            .take(elite_count)
            .map(|s| Seed {
                genome: s.genome.clone(),
                generation: s.generation,
                elite: true,
            })
            .collect();

        while seeds.len() < target {
            let (Some(ia), Some(ib)) = (
                self.select_parent_with_rng(&pool, rng),
                self.select_parent_with_rng(&pool, rng),
            ) else {
                return Err(CoreError::EmptyPopulation);
            };
            let (a, b) = (&pool[ia], &pool[ib]);
            let genome = match self.breed_with_rng(&a.genome, &b.genome, rng) {
                Ok(g) => g,
                Err(e) => {
                    tracing::warn!(error = %e, "Incompatible parents, cloning one instead");
                    let mut g = a.genome.clone();
                    self.mutate_with_rng(&mut g, rng);
                    g
                }
            };
            seeds.push(Seed {
                genome,
                generation: a.generation.max(b.generation) + 1,
                elite: false,
            });
        }

        if let Some(max_gen) = seeds.iter().map(|s| s.generation).max() {
            self.observe_generation(max_gen);
        }
        tracing::info!(
            target,
            elites = elite_count,
            pool = pool.len(),
            "Population reseeded"
        );
        Ok(seeds)
    }
}

/// Selection over a scored pool.
///
/// Fitness-proportionate falls back to a uniform draw when total fitness is
/// zero, negative or not finite.
pub fn select_index<R: Rng>(
    policy: SelectionPolicy,
    pool: &[ScoredGenome],
    rng: &mut R,
) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    match policy {
        SelectionPolicy::FitnessProportionate => {
            let total: f64 = pool.iter().map(|s| s.fitness.max(0.0)).sum();
            if !(total > 0.0 && total.is_finite()) {
                return Some(rng.gen_range(0..pool.len()));
            }
            let mut spin = rng.gen_range(0.0..total);
            for (i, s) in pool.iter().enumerate() {
                let share = s.fitness.max(0.0);
                if spin < share {
                    return Some(i);
                }
                spin -= share;
            }
            pool.iter().rposition(|s| s.fitness > 0.0)
        }
        SelectionPolicy::Tournament { size } => {
            let mut best = rng.gen_range(0..pool.len());
            for _ in 1..size.max(1) {
                let challenger = rng.gen_range(0..pool.len());
                if pool[challenger].fitness > pool[best].fitness {
                    best = challenger;
                }
            }
            Some(best)
        }
    }
}

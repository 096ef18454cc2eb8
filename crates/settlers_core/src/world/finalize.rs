use crate::brain::GenomeLogic;
use crate::error::{CoreError, CoreResult};
use crate::evolution::ScoredGenome;
use crate::world::World;

impl World {
    /// Live agents with the fitness they would record if they died now.
    #[must_use]
    pub fn scored_live(&self) -> Vec<ScoredGenome> {
        self.agents
            .iter()
            .map(|a| ScoredGenome {
                genome: a.genome.clone(),
                fitness: self.ctx.engine.fitness_of(&a.fitness),
                generation: a.generation,
            })
            .collect()
    }

    /// Everything worth saving: live agents followed by the fitness archive,
    /// best first.
    #[must_use]
    pub fn scored_genomes(&self) -> Vec<ScoredGenome> {
        let mut all = self.scored_live();
        all.extend(self.ctx.engine.archive().iter().cloned());
        all.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        all
    }

    /// Replaces the population with previously saved genomes.
    ///
    /// Each genome keeps its own generation. The fittest usable genomes, up
    /// to `initial_population`, become live agents; the rest go to the
    /// fitness archive. `generation` and `best_fitness` carry the saved run's
    /// records forward. Genomes with the wrong weight count are skipped.
    /// Fails with `EmptyPopulation` when none are usable, leaving the world
    /// unchanged.
    pub fn restore_population(
        &mut self,
        saved: Vec<ScoredGenome>,
        generation: u32,
        best_fitness: f64,
    ) -> CoreResult<usize> {
        let mut usable: Vec<ScoredGenome> = saved
            .into_iter()
            .filter(|s| match s.genome.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping saved genome");
                    false
                }
            })
            .collect();
        if usable.is_empty() {
            return Err(CoreError::EmptyPopulation);
        }
        usable.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        let live = self.config.world.initial_population.min(usable.len());
        let archived = usable.split_off(live);

        let founders = usable.into_iter().map(|s| (s.genome, s.generation)).collect();
        let restored = self.replace_population(founders);
        let archived_count = archived.len();
        self.ctx.engine.seed_history(best_fitness, generation, archived);
        self.refresh_stats();
        tracing::info!(restored, archived = archived_count, generation, "Population restored");
        Ok(restored)
    }

    /// Starts over with random founders after an extinction.
    pub fn reseed_from_scratch(&mut self) -> usize {
        let added = self.seed_random_population();
        self.observer
            .on_reseed(added, self.ctx.engine.current_generation(), self.ctx.tick);
        self.refresh_stats();
        tracing::info!(added, "Population reseeded from scratch");
        added
    }

    #[must_use]
    pub fn is_extinct(&self) -> bool {
        self.agents.is_empty()
    }
}

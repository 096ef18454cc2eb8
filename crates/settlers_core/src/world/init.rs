use crate::brain::GenomeLogic;
use crate::clock::DayClock;
use crate::config::AppConfig;
use crate::environment::{FlatTerrain, HouseRegistry, ResourceField};
use crate::evolution::EvolutionEngine;
use crate::interfaces::{ResourceProvider, ShelterRegistry, Terrain};
use crate::lifecycle;
use crate::metrics::Metrics;
use crate::world::{SimContext, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use settlers_data::{AgentId, Genome, PopulationStats, Position};

/// Hour of day zero the clock starts at.
const START_HOUR: f64 = 8.0;
/// Founders starting as adults are spread over this many seconds past `adult_age`.
const FOUNDER_AGE_SPREAD: f64 = 60.0;

impl World {
    /// World with the reference collaborators and a random founding population.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let mut rng = seeded_rng(&config);
        let terrain = FlatTerrain::default();
        let resources = ResourceField::scatter_with_rng(
            config.world.width,
            config.world.depth,
            config.world.initial_food,
            config.world.initial_game,
            config.world.initial_threats,
            &mut rng,
        );
        let shelters = HouseRegistry::scatter_with_rng(
            config.world.house_count,
            config.lifecycle.house_capacity,
            config.world.width,
            config.world.depth,
            &terrain,
            &mut rng,
        );
        let mut world = Self::with_collaborators(
            config,
            Box::new(terrain),
            Box::new(resources),
            Box::new(shelters),
        )?;
        world.rng = rng;
        world.seed_random_population();
        Ok(world)
    }

    /// Empty world around caller-supplied collaborators.
    pub fn with_collaborators(
        config: AppConfig,
        terrain: Box<dyn Terrain>,
        resources: Box<dyn ResourceProvider>,
        shelters: Box<dyn ShelterRegistry>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(&config);
        let world_seed = config.world.seed.unwrap_or_else(|| rng.gen());
        let ctx = SimContext {
            tick: 0,
            next_agent_id: 1,
            world_seed,
            clock: DayClock::starting_at_hour(config.world.day_length, START_HOUR),
            engine: EvolutionEngine::new(config.evolution.clone()),
        };
        Ok(Self {
            ctx,
            agents: Vec::new(),
            terrain,
            resources,
            shelters,
            observer: Self::default_observer(),
            advisor: Self::default_advisor(),
            metrics: Metrics::new(),
            pop_stats: PopulationStats::default(),
            rng,
            config,
        })
    }

    /// Replaces the roster with `initial_population` random founders.
    pub fn seed_random_population(&mut self) -> usize {
        let genomes: Vec<(Genome, u32)> = (0..self.config.world.initial_population)
            .map(|_| (Genome::new_random_with_rng(&mut self.rng), 0))
            .collect();
        self.replace_population(genomes)
    }

    /// Adds one agent at `(x, z)`, height taken from terrain. Returns its id.
    pub fn spawn_agent(
        &mut self,
        genome: Genome,
        x: f64,
        z: f64,
        generation: u32,
        parents: Vec<AgentId>,
    ) -> AgentId {
        let id = self.ctx.allocate_id();
        let position = Position::new(x, self.terrain.height(x, z), z);
        let mut agent =
            lifecycle::create_agent(id, genome, generation, parents, position, self.ctx.tick);
        agent.heading = self.rng.gen_range(0.0..std::f64::consts::TAU);
        self.observer.on_birth(&agent, self.ctx.tick);
        self.ctx.engine.observe_generation(generation);
        self.agents.push(agent);
        id
    }

    /// Spawns founders at random positions, optionally already adult.
    pub(crate) fn spawn_founders(&mut self, genomes: Vec<(Genome, u32)>) -> Vec<AgentId> {
        let (hw, hd) = (self.config.world.width / 2.0, self.config.world.depth / 2.0);
        let mut ids = Vec::with_capacity(genomes.len());
        for (genome, generation) in genomes {
            let x = self.rng.gen_range(-hw..hw);
            let z = self.rng.gen_range(-hd..hd);
            let id = self.spawn_agent(genome, x, z, generation, Vec::new());
            if self.config.world.founders_start_adult {
                let lc = &self.config.lifecycle;
                let spread = FOUNDER_AGE_SPREAD.min((lc.elder_age - lc.adult_age) * 0.5);
                let age = lc.adult_age + self.rng.gen_range(0.0..=spread);
                if let Some(agent) = self.agents.last_mut() {
                    agent.age = age;
                    agent.stage = lifecycle::stage_for_age(age, lc);
                }
            }
            ids.push(id);
        }
        ids
    }

    /// Drops every live agent (freeing their house slots) and spawns `genomes`.
    pub(crate) fn replace_population(&mut self, genomes: Vec<(Genome, u32)>) -> usize {
        for agent in &self.agents {
            if let Some(house) = agent.house {
                self.shelters.release_slot(house, agent.id);
            }
        }
        self.agents.clear();
        self.spawn_founders(genomes).len()
    }
}

fn seeded_rng(config: &AppConfig) -> ChaCha8Rng {
    match config.world.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
